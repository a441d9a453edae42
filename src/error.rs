//! Error types shared across the service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type for roadrisk operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Ranking requested with no candidate routes. Caller contract
    /// violation, rejected explicitly rather than returning index 0.
    #[error("cannot rank an empty route set")]
    EmptyRouteSet,

    /// Invalid user input or request parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Destination could not be resolved to coordinates
    #[error("geocoding failed: {0}")]
    Geocode(String),

    /// Routing backend returned an unusable response
    #[error("routing error: {0}")]
    Routing(String),

    /// Upstream HTTP failure (wraps reqwest::Error)
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration loading or validation error
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::EmptyRouteSet | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Geocode(_) => StatusCode::NOT_FOUND,
            Error::Routing(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
