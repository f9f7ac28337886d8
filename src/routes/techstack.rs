/**
 * Tech Stack Routes
 * Public listing and admin management of the skills shown on the site
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::{
    db::models::TechStackItem,
    error::{AppError, AppJson, AppQuery},
    services::{
        pagination::{PageRequest, Pagination},
        techstack::{self, TechStackFilter, TechStackInput},
    },
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/techstack
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackListQuery {
    pub category: Option<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
    #[serde(default)]
    pub include_hidden: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackListResponse {
    pub tech_stack: Vec<TechStackItem>,
    pub pagination: Pagination,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/techstack
pub async fn list_tech_stack(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TechStackListQuery>,
) -> Result<Json<TechStackListResponse>, AppError> {
    let filter = TechStackFilter::parse(query.category.as_deref(), query.include_hidden)?;
    let page = PageRequest::new(query.page, query.limit, techstack::DEFAULT_PAGE_SIZE);
    let found = techstack::list(&state.store, &filter, page).await?;

    Ok(Json(TechStackListResponse {
        tech_stack: found.items,
        pagination: found.pagination,
    }))
}

/// GET /api/techstack/{id}
pub async fn get_tech(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TechStackItem>, AppError> {
    Ok(Json(techstack::get(&state.store, &id).await?))
}

/// POST /api/techstack (admin only)
pub async fn create_tech(
    State(state): State<AppState>,
    AppJson(input): AppJson<TechStackInput>,
) -> Result<(StatusCode, Json<TechStackItem>), AppError> {
    let item = techstack::create(&state.store, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/techstack/{id} (admin only)
pub async fn update_tech(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<TechStackInput>,
) -> Result<Json<TechStackItem>, AppError> {
    Ok(Json(techstack::update(&state.store, &id, input).await?))
}

/// PUT /api/techstack/{id}/toggle-visibility (admin only)
pub async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TechStackItem>, AppError> {
    Ok(Json(techstack::toggle_visibility(&state.store, &id).await?))
}

/// DELETE /api/techstack/{id} (admin only)
pub async fn delete_tech(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    techstack::delete(&state.store, &id).await?;
    Ok(Json(MessageResponse::new("Tech stack item deleted successfully")))
}
