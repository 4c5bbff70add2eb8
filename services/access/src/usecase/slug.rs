use std::marker::PhantomData;

use crate::domain::repository::SlugRepository;
use crate::domain::types::{
    SlugKind, SlugRecord, ensure_slug_length, ensure_slug_present, validate_id,
};
use crate::error::AccessServiceError;

/// CRUD over one slug-identified entity kind (roles or permissions).
///
/// `create` checks, in order: slug present, slug not taken, slug length.
/// `find_one`, `update` and `remove` reject non-positive ids before touching the store.
pub struct SlugUseCase<K: SlugKind, R: SlugRepository<K>> {
    pub repo: R,
    kind: PhantomData<K>,
}

impl<K: SlugKind, R: SlugRepository<K>> SlugUseCase<K, R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            kind: PhantomData,
        }
    }

    pub async fn create(&self, slug: &str) -> Result<SlugRecord, AccessServiceError> {
        ensure_slug_present::<K>(slug)?;
        let existing = self.repo.find_by_slug(slug).await?;
        ensure_slug_length(slug)?;
        if existing.is_some() {
            return Err(K::already_exists());
        }
        let record = self.repo.create(slug).await?;
        tracing::info!(kind = K::LABEL, id = record.id, slug = %record.slug, "created");
        Ok(record)
    }

    pub async fn find_all(&self) -> Result<Vec<SlugRecord>, AccessServiceError> {
        self.repo.list().await
    }

    pub async fn find_one(&self, id: i32) -> Result<SlugRecord, AccessServiceError> {
        let id = validate_id(id)?;
        self.repo.find_by_id(id).await?.ok_or_else(K::not_found)
    }

    pub async fn update(&self, id: i32, slug: &str) -> Result<SlugRecord, AccessServiceError> {
        let current = self.find_one(id).await?;
        ensure_slug_present::<K>(slug)?;
        ensure_slug_length(slug)?;
        let record = self.repo.update_slug(current.id, slug).await?;
        tracing::info!(kind = K::LABEL, id = record.id, slug = %record.slug, "updated");
        Ok(record)
    }

    /// Delete the row and return what it looked like beforehand.
    pub async fn remove(&self, id: i32) -> Result<SlugRecord, AccessServiceError> {
        let snapshot = self.find_one(id).await?;
        self.repo.delete(snapshot.id).await?;
        tracing::info!(kind = K::LABEL, id = snapshot.id, "deleted");
        Ok(snapshot)
    }
}
