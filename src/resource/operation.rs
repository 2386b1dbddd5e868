use axum::http::Method;
use axum::routing::MethodFilter;
use std::fmt;

/// The five CRUD operations a resource exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Create,
    Update,
    Delete,
    GetItem,
    GetList,
}

impl Operation {
    /// Route registration order.
    pub const ALL: [Operation; 5] = [
        Operation::GetList,
        Operation::Create,
        Operation::GetItem,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::GetItem => "get_item",
            Operation::GetList => "get_list",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::GetList | Operation::GetItem => Method::GET,
            Operation::Create => Method::POST,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }
    }

    pub(crate) fn method_filter(self) -> MethodFilter {
        match self {
            Operation::GetList | Operation::GetItem => MethodFilter::GET,
            Operation::Create => MethodFilter::POST,
            Operation::Update => MethodFilter::PUT,
            Operation::Delete => MethodFilter::DELETE,
        }
    }

    /// Whether the route addresses a single record (`{path}/:id`).
    pub fn targets_item(self) -> bool {
        matches!(self, Operation::GetItem | Operation::Update | Operation::Delete)
    }

    pub fn route(self, base: &str) -> String {
        if self.targets_item() {
            format!("{}/:id", base)
        } else {
            base.to_string()
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
