use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::domain::types::RoleKind;
use crate::error::AccessServiceError;
use crate::handlers::slug::{self, SlugRecordResponse, SlugRequest, SlugResponse};
use crate::state::AppState;

// ── POST /roles ─────────────────────────────────────────────────────────────

pub async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<SlugRequest>,
) -> Result<(StatusCode, Json<SlugResponse>), AccessServiceError> {
    slug::create::<RoleKind, _>(state.role_repo(), body).await
}

// ── GET /roles ──────────────────────────────────────────────────────────────

pub async fn get_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<SlugResponse>>, AccessServiceError> {
    slug::list::<RoleKind, _>(state.role_repo()).await
}

// ── GET /roles/{id} ─────────────────────────────────────────────────────────

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SlugResponse>, AccessServiceError> {
    slug::get::<RoleKind, _>(state.role_repo(), id).await
}

// ── PATCH /roles/{id} ───────────────────────────────────────────────────────

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<SlugRequest>,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    slug::update::<RoleKind, _>(state.role_repo(), id, body).await
}

// ── DELETE /roles/{id} ──────────────────────────────────────────────────────

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    slug::delete::<RoleKind, _>(state.role_repo(), id).await
}
