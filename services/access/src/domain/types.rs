use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::AccessServiceError;

/// Maximum slug length, counted in characters.
pub const SLUG_MAX_LEN: usize = 60;

/// An entity kind identified by a unique slug (roles, permissions).
///
/// The slug use cases are written once against this trait; each kind only
/// supplies its field label and the errors it reports.
pub trait SlugKind: Send + Sync + 'static {
    /// Field label used in "must not be empty" messages.
    const LABEL: &'static str;

    fn not_found() -> AccessServiceError;
    fn already_exists() -> AccessServiceError;
}

pub struct RoleKind;

impl SlugKind for RoleKind {
    const LABEL: &'static str = "role";

    fn not_found() -> AccessServiceError {
        AccessServiceError::RoleNotFound
    }

    fn already_exists() -> AccessServiceError {
        AccessServiceError::RoleAlreadyExists
    }
}

pub struct PermissionKind;

impl SlugKind for PermissionKind {
    const LABEL: &'static str = "permission";

    fn not_found() -> AccessServiceError {
        AccessServiceError::PermissionNotFound
    }

    fn already_exists() -> AccessServiceError {
        AccessServiceError::PermissionAlreadyExists
    }
}

/// A role or permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugRecord {
    pub id: i32,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User account as exposed by the service. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated user row, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Outcome of a provisioning transaction.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub user: User,
    /// Permission ids that were newly granted to the role, ascending.
    pub new_grants: Vec<i32>,
}

/// Partial user update. At least one field must be set.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Surrogate ids are positive; zero and negatives mean "unset".
pub fn validate_id(id: i32) -> Result<i32, AccessServiceError> {
    if id <= 0 {
        return Err(AccessServiceError::InvalidId);
    }
    Ok(id)
}

pub fn ensure_slug_present<K: SlugKind>(slug: &str) -> Result<(), AccessServiceError> {
    if slug.is_empty() {
        return Err(AccessServiceError::MissingField(K::LABEL));
    }
    Ok(())
}

pub fn ensure_slug_length(slug: &str) -> Result<(), AccessServiceError> {
    if slug.chars().count() > SLUG_MAX_LEN {
        return Err(AccessServiceError::SlugTooLong);
    }
    Ok(())
}

/// Requested permission ids not yet granted, ascending.
pub fn missing_grants(
    requested: &BTreeSet<i32>,
    existing: impl IntoIterator<Item = i32>,
) -> Vec<i32> {
    let existing: BTreeSet<i32> = existing.into_iter().collect();
    requested.difference(&existing).copied().collect()
}
