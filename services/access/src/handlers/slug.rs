//! Request/response shapes and handler bodies shared by `/roles` and `/permissions`.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::repository::SlugRepository;
use crate::domain::types::{SlugKind, SlugRecord};
use crate::error::AccessServiceError;
use crate::usecase::slug::SlugUseCase;

#[derive(Deserialize)]
pub struct SlugRequest {
    #[serde(default)]
    pub slug: String,
}

#[derive(Serialize)]
pub struct SlugResponse {
    pub id: i32,
    pub slug: String,
}

impl From<SlugRecord> for SlugResponse {
    fn from(record: SlugRecord) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
        }
    }
}

/// Full row, returned by update and delete.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugRecordResponse {
    pub id: i32,
    pub slug: String,
    #[serde(serialize_with = "gatekeep_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "gatekeep_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SlugRecord> for SlugRecordResponse {
    fn from(record: SlugRecord) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

pub async fn create<K: SlugKind, R: SlugRepository<K>>(
    repo: R,
    body: SlugRequest,
) -> Result<(StatusCode, Json<SlugResponse>), AccessServiceError> {
    let record = SlugUseCase::<K, R>::new(repo).create(&body.slug).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn list<K: SlugKind, R: SlugRepository<K>>(
    repo: R,
) -> Result<Json<Vec<SlugResponse>>, AccessServiceError> {
    let records = SlugUseCase::<K, R>::new(repo).find_all().await?;
    Ok(Json(records.into_iter().map(SlugResponse::from).collect()))
}

pub async fn get<K: SlugKind, R: SlugRepository<K>>(
    repo: R,
    id: i32,
) -> Result<Json<SlugResponse>, AccessServiceError> {
    let record = SlugUseCase::<K, R>::new(repo).find_one(id).await?;
    Ok(Json(record.into()))
}

pub async fn update<K: SlugKind, R: SlugRepository<K>>(
    repo: R,
    id: i32,
    body: SlugRequest,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    let record = SlugUseCase::<K, R>::new(repo).update(id, &body.slug).await?;
    Ok(Json(record.into()))
}

pub async fn delete<K: SlugKind, R: SlugRepository<K>>(
    repo: R,
    id: i32,
) -> Result<Json<SlugRecordResponse>, AccessServiceError> {
    let record = SlugUseCase::<K, R>::new(repo).remove(id).await?;
    Ok(Json(record.into()))
}
