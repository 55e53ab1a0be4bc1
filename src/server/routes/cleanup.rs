//! Mock diagram cleanup endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::diagram::{cleanup_commands, decode_image, DrawCommand};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub image_data: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub commands: Vec<DrawCommand>,
    pub success: bool,
    pub message: &'static str,
}

/// POST /ai/cleanup - Replace a sketch with a tidy flowchart.
pub async fn ai_cleanup(Json(body): Json<CleanupRequest>) -> Result<Json<CleanupResponse>, ApiError> {
    let size = decode_image(&body.image_data).map_err(|e| {
        tracing::error!(?e, "Failed to decode image");
        ApiError::bad_request("Invalid image data")
    })?;
    tracing::debug!(bytes = size, "Cleaning up diagram");

    Ok(Json(CleanupResponse {
        commands: cleanup_commands(),
        success: true,
        message: "Diagram cleaned successfully",
    }))
}
