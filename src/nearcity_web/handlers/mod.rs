use std::fmt::{Debug, Display};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

pub mod cities;

/// An error that is reported to the client with the given status code.
/// Anything convertible into an [anyhow::Error] becomes an internal server error.
pub struct WebError {
    status: StatusCode,
    error: anyhow::Error,
}

#[derive(Serialize)]
struct ErrorView {
    detail: String,
}

impl WebError {
    pub fn new<M>(status: StatusCode, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self { status, error: anyhow::Error::msg(message) }
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// An upstream service failed. The cause is logged, not sent to the client.
    pub fn bad_gateway(error: anyhow::Error) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, error }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let detail = if self.status.is_server_error() {
            if self.status == StatusCode::BAD_GATEWAY {
                warn!("Upstream request failed: {:?}", self.error);
            } else {
                error!("Request failed: {:?}", self.error);
            }

            self.status.canonical_reason().unwrap_or("Error").to_owned()
        } else {
            self.error.to_string()
        };

        (self.status, Json(ErrorView { detail })).into_response()
    }
}

impl<T: Into<anyhow::Error>> From<T> for WebError {
    fn from(err: T) -> Self {
        WebError { status: StatusCode::INTERNAL_SERVER_ERROR, error: err.into() }
    }
}
