//! JSON API routes.
//!
//! Rate limited separately from the pages. Errors come back as
//! `{"error": "..."}` with a 400 status.

pub mod pc_builder;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub use pc_builder::{components, summary};

/// Error response for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

impl From<rigbay_core::build::BuildError> for ApiError {
    fn from(err: rigbay_core::build::BuildError) -> Self {
        Self::new(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
