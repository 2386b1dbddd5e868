mod common;

use axum::{http::Method, http::StatusCode, Router};
use common::{json, send, send_raw, MockOp, MockStorage, TestModel};
use resource_sdk::{ResourceManager, StorageError};
use serde_json::json;
use std::sync::Arc;

fn seeded() -> Arc<MockStorage> {
    Arc::new(MockStorage::with_records(vec![
        json!({"id": 2, "name": "second"}),
        json!({"id": 1, "name": "first"}),
    ]))
}

fn router(storage: Arc<MockStorage>) -> Router {
    ResourceManager::new(storage)
        .create_resource::<TestModel>()
        .register_routes(Router::new())
}

#[tokio::test]
async fn list_returns_storage_order() {
    let storage = seeded();
    let (status, body) = send(&router(storage.clone()), Method::GET, "/testmodels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!([{"id": 2, "name": "second"}, {"id": 1, "name": "first"}]));
    assert_eq!(storage.calls(), vec![MockOp::FindAll]);
}

#[tokio::test]
async fn list_of_empty_storage_is_an_empty_array() {
    let (status, body) = send(&router(Arc::new(MockStorage::new())), Method::GET, "/testmodels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!([]));
}

#[tokio::test]
async fn get_item_found_and_missing() {
    let app = router(seeded());
    let (status, body) = send(&app, Method::GET, "/testmodels/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"id": 1, "name": "first"}));

    let (status, body) = send(&app, Method::GET, "/testmodels/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"]["code"], "not_found");
    assert_eq!(json(&body)["error"]["message"], "record not found");
}

#[tokio::test]
async fn create_assigns_an_identifier() {
    let storage = Arc::new(MockStorage::new());
    let (status, body) = send(&router(storage.clone()), Method::POST, "/testmodels", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::OK);
    let created = json(&body);
    assert_ne!(created["id"], json!(0));
    assert_eq!(created["name"], "x");
    assert_eq!(storage.records(), vec![created]);
}

#[tokio::test]
async fn update_keeps_the_addressed_identifier() {
    let storage = seeded();
    let app = router(storage.clone());
    let (status, body) = send(&app, Method::PUT, "/testmodels/1", Some(json!({"name": "y"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"id": 1, "name": "y"}));

    let (status, body) = send(&app, Method::PUT, "/testmodels/2", Some(json!({"id": 99, "name": "z"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"id": 2, "name": "z"}));
    assert_eq!(storage.records(), vec![json!({"id": 2, "name": "z"}), json!({"id": 1, "name": "y"})]);
}

#[tokio::test]
async fn update_of_missing_record_is_not_found() {
    let storage = seeded();
    let (status, _) = send(&router(storage.clone()), Method::PUT, "/testmodels/7", Some(json!({"name": "y"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!storage.calls().contains(&MockOp::Save));
}

#[tokio::test]
async fn delete_then_delete_again() {
    let storage = seeded();
    let app = router(storage.clone());
    let (status, body) = send(&app, Method::DELETE, "/testmodels/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert_eq!(storage.records(), vec![json!({"id": 2, "name": "second"})]);

    let (status, _) = send(&app, Method::DELETE, "/testmodels/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(storage.records().len(), 1);
}

#[tokio::test]
async fn storage_failures_are_internal_errors_without_mutation() {
    let cases = [
        (MockOp::Create, Method::POST, "/testmodels", "failed to create record"),
        (MockOp::Save, Method::PUT, "/testmodels/1", "failed to update record"),
        (MockOp::Delete, Method::DELETE, "/testmodels/1", "failed to delete record"),
        (MockOp::FindAll, Method::GET, "/testmodels", "failed to fetch records"),
        (MockOp::FindOne, Method::GET, "/testmodels/1", "database error"),
    ];
    for (op, method, uri, message) in cases {
        let storage = seeded();
        storage.fail(op, || StorageError::Backend("connection reset".into()));
        let before = storage.records();
        let (status, body) = send(&router(storage.clone()), method, uri, Some(json!({"name": "n"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{:?}", op);
        assert_eq!(json(&body)["error"]["code"], "storage_failure");
        assert_eq!(json(&body)["error"]["message"], message);
        assert!(!String::from_utf8_lossy(&body).contains("connection reset"));
        assert_eq!(storage.records(), before);
    }
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let storage = seeded();
    let app = router(storage.clone());
    let (status, body) = send_raw(&app, Method::POST, "/testmodels", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"]["code"], "malformed_input");

    let (status, _) = send(&app, Method::PUT, "/testmodels/1", Some(json!({"name": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!storage.calls().contains(&MockOp::Create));
    assert!(!storage.calls().contains(&MockOp::Save));
}

#[tokio::test]
async fn concurrent_list_and_create_do_not_interfere() {
    let storage = Arc::new(MockStorage::new());
    let app = router(storage.clone());
    let mut tasks = Vec::new();
    for i in 0..10 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                send(&app, Method::POST, "/testmodels", Some(json!({"name": format!("n{}", i)}))).await.0
            } else {
                send(&app, Method::GET, "/testmodels", None).await.0
            }
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    let mut ids: Vec<u64> = storage.records().iter().filter_map(|r| r["id"].as_u64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}
