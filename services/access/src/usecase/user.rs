use std::collections::BTreeSet;

use anyhow::Context as _;

use crate::domain::repository::{PasswordHasher, SlugRepository, UserRepository};
use crate::domain::types::{NewUser, PermissionKind, RoleKind, User, UserChanges, validate_id};
use crate::error::AccessServiceError;

// ── CreateUser ───────────────────────────────────────────────────────────────

/// Raw provisioning request. Optional fields model "absent" at the boundary so that
/// an explicit `is_active: false` is distinguishable from a missing value.
#[derive(Clone, Default)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_active: Option<bool>,
    pub role_id: Option<i32>,
    pub permission_ids: Option<Vec<i32>>,
}

/// Upper bound on `permission_ids` per request. Both the existence lookup and the grant
/// insert bind one parameter per id.
pub const MAX_PERMISSION_IDS: usize = 1_000;

struct ValidatedUser {
    name: String,
    email: String,
    password: String,
    is_active: bool,
    role_id: i32,
    permission_ids: BTreeSet<i32>,
}

/// Structural checks, first failure wins. Touches nothing but the input.
fn validate_create_input(input: CreateUserInput) -> Result<ValidatedUser, AccessServiceError> {
    if input.name.is_empty() {
        return Err(AccessServiceError::MissingField("name"));
    }
    if input.email.is_empty() {
        return Err(AccessServiceError::MissingField("e-mail"));
    }
    if input.password.is_empty() {
        return Err(AccessServiceError::MissingField("password"));
    }
    let is_active = input
        .is_active
        .ok_or(AccessServiceError::MissingField("is active"))?;
    let role_id = match input.role_id {
        None | Some(0) => return Err(AccessServiceError::MissingField("role id")),
        Some(id) => validate_id(id)?,
    };
    let permission_ids = match input.permission_ids {
        Some(ids) if ids.len() > MAX_PERMISSION_IDS => {
            return Err(AccessServiceError::TooManyPermissionIds(MAX_PERMISSION_IDS));
        }
        Some(ids) if !ids.is_empty() => ids
            .into_iter()
            .map(validate_id)
            .collect::<Result<BTreeSet<i32>, _>>()?,
        _ => return Err(AccessServiceError::MissingField("permission ids")),
    };
    Ok(ValidatedUser {
        name: input.name,
        email: input.email,
        password: input.password,
        is_active,
        role_id,
        permission_ids,
    })
}

/// Creates a user, assigns its role and tops up the role's permission grants.
///
/// Phases run strictly in order and stop at the first failure:
/// validate → e-mail uniqueness → role/permission existence → hash → one store transaction.
/// Nothing is written unless every check before the transaction passed.
pub struct CreateUserUseCase<U, R, P, H>
where
    U: UserRepository,
    R: SlugRepository<RoleKind>,
    P: SlugRepository<PermissionKind>,
    H: PasswordHasher,
{
    pub users: U,
    pub roles: R,
    pub permissions: P,
    pub hasher: H,
}

impl<U, R, P, H> CreateUserUseCase<U, R, P, H>
where
    U: UserRepository,
    R: SlugRepository<RoleKind>,
    P: SlugRepository<PermissionKind>,
    H: PasswordHasher,
{
    pub async fn execute(&self, input: CreateUserInput) -> Result<User, AccessServiceError> {
        let ValidatedUser {
            name,
            email,
            password,
            is_active,
            role_id,
            permission_ids,
        } = validate_create_input(input)?;

        // Fast path only; the unique index on users.email is what actually holds the line.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccessServiceError::EmailAlreadyRegistered);
        }
        if self.roles.find_by_id(role_id).await?.is_none() {
            return Err(AccessServiceError::RoleNotFound);
        }
        let requested: Vec<i32> = permission_ids.iter().copied().collect();
        let found = self.permissions.find_by_ids(&requested).await?;
        if found.len() != requested.len() {
            return Err(AccessServiceError::PermissionNotFound);
        }

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .context("join password hashing task")??;

        let new_user = NewUser {
            name,
            email,
            password_hash,
            is_active,
        };
        let provisioned = self
            .users
            .provision(&new_user, role_id, &permission_ids)
            .await?;
        tracing::info!(
            user_id = provisioned.user.id,
            role_id,
            new_grants = provisioned.new_grants.len(),
            "user provisioned"
        );
        Ok(provisioned.user)
    }
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<User>, AccessServiceError> {
        self.users.list().await
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, id: i32) -> Result<User, AccessServiceError> {
        let id = validate_id(id)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AccessServiceError::UserNotFound)
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateUserUseCase<U> {
    pub async fn execute(&self, id: i32, changes: UserChanges) -> Result<User, AccessServiceError> {
        let id = validate_id(id)?;
        if changes.name.is_none() && changes.is_active.is_none() {
            return Err(AccessServiceError::MissingData);
        }
        if changes.name.as_deref() == Some("") {
            return Err(AccessServiceError::MissingField("name"));
        }
        if self.users.find_by_id(id).await?.is_none() {
            return Err(AccessServiceError::UserNotFound);
        }
        self.users.update(id, &changes).await
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    /// Returns the user as it was before deletion.
    pub async fn execute(&self, id: i32) -> Result<User, AccessServiceError> {
        let id = validate_id(id)?;
        let snapshot = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AccessServiceError::UserNotFound)?;
        self.users.delete(id).await?;
        tracing::info!(user_id = id, "user deleted");
        Ok(snapshot)
    }
}
