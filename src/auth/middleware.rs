//! Request gates.
//!
//! `authenticate` verifies the bearer token and attaches an [`Identity`];
//! `require_admin` must be layered inside it and checks the attached role.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::token::Claims;
use crate::{db::models::Role, error::AppError, state::AppState};

/// Who is making the request, as established by [`authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(Claims),
}

impl Identity {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(claims) => Some(claims),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.claims()
            .is_some_and(|claims| Role::parse(&claims.role).is_some())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extract bearer token from Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| AppError::forbidden("Invalid token"))?;

    request
        .extensions_mut()
        .insert(Identity::Authenticated(claims));
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let allowed = request
        .extensions()
        .get::<Identity>()
        .is_some_and(Identity::is_admin);

    if !allowed {
        return Err(AppError::forbidden("Admin access required"));
    }
    Ok(next.run(request).await)
}
