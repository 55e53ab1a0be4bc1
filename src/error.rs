//! Error types shared across the relay and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Reply sent to a peer whose payload is not JSON.
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid JSON format";

/// Reply sent to a peer whose JSON does not describe a drawing event.
pub const INVALID_EVENT_MESSAGE: &str = "Error processing drawing data";

/// Why an inbound frame was rejected.
///
/// Both variants are reported to the origin only and never disconnect it.
#[derive(Debug, Error)]
pub enum InboundError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("payload is not a drawing event: {0}")]
    Schema(String),
}

impl InboundError {
    /// Message placed in the `{"error": ...}` reply.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Malformed(_) => INVALID_FORMAT_MESSAGE,
            Self::Schema(_) => INVALID_EVENT_MESSAGE,
        }
    }

    /// Serialized `{"error": ...}` frame for the origin.
    pub fn to_reply(&self) -> String {
        error_frame(self.client_message())
    }
}

/// Builds an `{"error": "<message>"}` text frame.
pub fn error_frame(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Errors returned by HTTP route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::BadRequest(msg) => msg,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(error = %self, %status, "Request rejected");
        (status, Json(ErrorBody { detail: self.detail() })).into_response()
    }
}

/// Fatal errors while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to install shutdown handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
