//! Demo login and registration endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts::Registration;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /register - Create a demo account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Json<AuthResponse> {
    let response = match state.accounts.register(&body.email, &body.password) {
        Registration::Created => AuthResponse {
            success: true,
            message: "Registration successful! Please login.",
        },
        Registration::AlreadyRegistered => AuthResponse {
            success: false,
            message: "Email already registered!",
        },
    };
    Json(response)
}

/// POST /login - Check demo credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Json<AuthResponse> {
    if state.accounts.verify(&body.email, &body.password) {
        Json(AuthResponse {
            success: true,
            message: "Login successful!",
        })
    } else {
        tracing::debug!(email = %body.email, "Login rejected");
        Json(AuthResponse {
            success: false,
            message: "Invalid email or password!",
        })
    }
}
