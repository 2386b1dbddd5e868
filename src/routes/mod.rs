//! Routes that live beside the generated resource routes.

mod common;

pub use common::{health_routes, READY_TIMEOUT};
