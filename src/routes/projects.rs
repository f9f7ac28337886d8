/**
 * Project Routes
 * Public listing and admin CRUD for portfolio projects
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::{
    db::models::Project,
    error::{AppError, AppJson, AppQuery},
    services::{
        pagination::{PageRequest, Pagination},
        projects::{self, ProjectFilter, ProjectInput},
    },
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/projects
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub pagination: Pagination,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProjectListQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let filter = ProjectFilter::parse(query.status.as_deref(), query.category.as_deref())?;
    let page = PageRequest::new(query.page, query.limit, projects::DEFAULT_PAGE_SIZE);
    let found = projects::list(&state.store, &filter, page).await?;

    Ok(Json(ProjectListResponse {
        projects: found.items,
        pagination: found.pagination,
    }))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(projects::get(&state.store, &id).await?))
}

/// POST /api/projects (admin only)
pub async fn create_project(
    State(state): State<AppState>,
    AppJson(input): AppJson<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = projects::create(&state.store, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/{id} (admin only)
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<ProjectInput>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(projects::update(&state.store, &id, input).await?))
}

/// DELETE /api/projects/{id} (admin only)
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    projects::delete(&state.store, &id).await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
