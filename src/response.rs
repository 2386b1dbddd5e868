//! Success responses for pipeline results.

use crate::state::State;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// `Empty` is 204 with no body; anything else is 200 with the JSON payload.
pub fn respond(state: State) -> Response {
    match state {
        State::Empty => StatusCode::NO_CONTENT.into_response(),
        State::Item(value) => (StatusCode::OK, Json(value)).into_response(),
        State::Collection(values) => (StatusCode::OK, Json(values)).into_response(),
    }
}
