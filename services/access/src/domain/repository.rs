#![allow(async_fn_in_trait)]

use std::collections::BTreeSet;

use crate::domain::types::{NewUser, Provisioned, SlugKind, SlugRecord, User, UserChanges};
use crate::error::AccessServiceError;

/// Repository for slug-identified entities of kind `K`.
pub trait SlugRepository<K: SlugKind>: Send + Sync {
    /// All rows in insertion order.
    async fn list(&self) -> Result<Vec<SlugRecord>, AccessServiceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<SlugRecord>, AccessServiceError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SlugRecord>, AccessServiceError>;

    /// Rows whose id is in `ids`; unknown ids are simply absent from the result.
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<SlugRecord>, AccessServiceError>;

    /// Insert a row. A store-level slug collision is reported as `K::already_exists()`.
    async fn create(&self, slug: &str) -> Result<SlugRecord, AccessServiceError>;

    /// Replace the slug and bump `updated_at`.
    async fn update_slug(&self, id: i32, slug: &str) -> Result<SlugRecord, AccessServiceError>;

    async fn delete(&self, id: i32) -> Result<(), AccessServiceError>;
}

/// Repository for user accounts and their role/permission linkage.
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, AccessServiceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AccessServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError>;

    /// Atomically insert the user, link it to `role_id` and grant the role every
    /// permission in `permission_ids` it does not already carry.
    ///
    /// Either every row is written or none is. A store-level e-mail collision on the
    /// user insert is reported as `EmailAlreadyRegistered`; any later failure is `Internal`.
    async fn provision(
        &self,
        user: &NewUser,
        role_id: i32,
        permission_ids: &BTreeSet<i32>,
    ) -> Result<Provisioned, AccessServiceError>;

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, AccessServiceError>;

    /// Delete the user. Its role assignment goes with it.
    async fn delete(&self, id: i32) -> Result<(), AccessServiceError>;
}

/// One-way salted password hashing.
pub trait PasswordHasher: Clone + Send + Sync + 'static {
    fn hash_password(&self, password: &str) -> Result<String, AccessServiceError>;
}
