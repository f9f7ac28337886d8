/**
 * Authentication Routes
 * Admin login, admin creation, and token verification
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Identity,
    db::models::AdminView,
    error::{AppError, AppJson},
    services::admins::{self, Credentials, NewAdmin},
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAdminResponse {
    pub message: String,
    pub admin: AdminView,
}

/// Identity carried by a verified token.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: VerifiedUser,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = admins::login(&state.store, &state.passwords, &state.tokens, credentials).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        user: session.admin,
    }))
}

/// POST /api/auth/admin (admin only)
pub async fn create_admin(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewAdmin>,
) -> Result<(StatusCode, Json<CreateAdminResponse>), AppError> {
    let admin = admins::create(&state.store, &state.passwords, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAdminResponse {
            message: "Admin created successfully".to_string(),
            admin,
        }),
    ))
}

/// GET /api/auth/verify
pub async fn verify_token(identity: Identity) -> Result<Json<VerifyResponse>, AppError> {
    let claims = identity
        .claims()
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    Ok(Json(VerifyResponse {
        valid: true,
        user: VerifiedUser {
            id: claims.sub.clone(),
            email: claims.email.clone(),
            role: claims.role.clone(),
        },
    }))
}
