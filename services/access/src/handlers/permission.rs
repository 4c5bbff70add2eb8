use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::domain::types::PermissionKind;
use crate::error::AccessServiceError;
use crate::handlers::slug::{self, SlugRecordResponse, SlugRequest, SlugResponse};
use crate::state::AppState;

// ── POST /permissions ─────────────────────────────────────────────────────────────

pub async fn create_permission(
    State(state): State<AppState>,
    Json(body): Json<SlugRequest>,
) -> Result<(StatusCode, Json<SlugResponse>), AccessServiceError> {
    slug::create::<PermissionKind, _>(state.permission_repo(), body).await
}

// ── GET /permissions ──────────────────────────────────────────────────────────────

pub async fn get_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SlugResponse>>, AccessServiceError> {
    slug::list::<PermissionKind, _>(state.permission_repo()).await
}

// ── GET /permissions/{id} ─────────────────────────────────────────────────────────

pub async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SlugResponse>, AccessServiceError> {
    slug::get::<PermissionKind, _>(state.permission_repo(), id).await
}

// ── PATCH /permissions/{id} ───────────────────────────────────────────────────────

pub async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<SlugRequest>,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    slug::update::<PermissionKind, _>(state.permission_repo(), id, body).await
}

// ── DELETE /permissions/{id} ──────────────────────────────────────────────────────

pub async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    slug::delete::<PermissionKind, _>(state.permission_repo(), id).await
}
