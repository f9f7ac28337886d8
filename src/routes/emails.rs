/**
 * Email Routes
 * Public contact form and the admin inbox
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::{
    db::models::EmailMessage,
    error::{AppError, AppJson, AppQuery},
    services::{
        emails::{self, ContactSubmission},
        pagination::{PageRequest, Pagination},
    },
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/emails
#[derive(Debug, Default, Deserialize)]
pub struct EmailListQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailListResponse {
    pub emails: Vec<EmailMessage>,
    pub unread_count: u64,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub reply_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub message: String,
    pub email: EmailMessage,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub count: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/emails (public contact form)
pub async fn submit_email(
    State(state): State<AppState>,
    AppJson(submission): AppJson<ContactSubmission>,
) -> Result<(StatusCode, Json<EmailMessage>), AppError> {
    let email = emails::submit(&state.store, submission).await?;
    Ok((StatusCode::CREATED, Json(email)))
}

/// GET /api/emails (admin only)
pub async fn list_emails(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EmailListQuery>,
) -> Result<Json<EmailListResponse>, AppError> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(emails::parse_status(raw)?),
        None => None,
    };
    let page = PageRequest::new(query.page, query.limit, emails::DEFAULT_PAGE_SIZE);
    let (found, unread_count) = emails::list(&state.store, status, page).await?;

    Ok(Json(EmailListResponse {
        emails: found.items,
        unread_count,
        pagination: found.pagination,
    }))
}

/// GET /api/emails/{id} (admin only). Opening an unread message marks it read.
pub async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailMessage>, AppError> {
    Ok(Json(emails::open(&state.store, &id).await?))
}

/// PUT /api/emails/{id}/status (admin only)
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<StatusUpdateRequest>,
) -> Result<Json<EmailMessage>, AppError> {
    let raw = body
        .status
        .ok_or_else(|| AppError::validation("Missing required fields: status"))?;
    let status = emails::parse_status(&raw)?;
    Ok(Json(emails::set_status(&state.store, &id, status).await?))
}

/// POST /api/emails/{id}/reply (admin only)
pub async fn reply_to_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ReplyRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let email = emails::reply(&state.store, &state.mailer, &id, body.reply_message).await?;
    Ok(Json(ReplyResponse {
        message: "Reply sent successfully".to_string(),
        email,
    }))
}

/// PUT /api/emails/mark-all-read (admin only)
pub async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let count = emails::mark_all_unread_as_read(&state.store).await?;
    Ok(Json(MarkAllReadResponse {
        message: format!("{count} emails marked as read"),
        count,
    }))
}

/// DELETE /api/emails/{id} (admin only)
pub async fn delete_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    emails::delete(&state.store, &id).await?;
    Ok(Json(MessageResponse::new("Email deleted successfully")))
}
