use std::collections::BTreeSet;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionError, TransactionTrait,
    sea_query::OnConflict,
};

use gatekeep_access_schema::{permissions, role_permissions, roles, user_roles, users};

use crate::domain::repository::{SlugRepository, UserRepository};
use crate::domain::types::{
    NewUser, PermissionKind, Provisioned, RoleKind, SlugKind, SlugRecord, User, UserChanges,
    missing_grants,
};
use crate::error::AccessServiceError;

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn is_foreign_key_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

/// Translate a failed write: unique-key collisions become `conflict`, a vanished row
/// becomes `not_found`, anything else is internal.
fn write_error(
    e: DbErr,
    conflict: AccessServiceError,
    not_found: AccessServiceError,
    context: &'static str,
) -> AccessServiceError {
    if is_unique_violation(&e) {
        return conflict;
    }
    if matches!(e, DbErr::RecordNotUpdated) {
        return not_found;
    }
    anyhow::Error::new(e).context(context).into()
}

/// Why a transaction body gave up: a domain rejection the caller should see as-is, or a
/// store error.
#[derive(Debug, thiserror::Error)]
enum TxnAbort {
    #[error(transparent)]
    Reject(AccessServiceError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

fn finish_transaction<T>(
    result: Result<T, TransactionError<TxnAbort>>,
    context: &'static str,
) -> Result<T, AccessServiceError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Transaction(TxnAbort::Reject(e))) => Err(e),
        Err(e) => Err(anyhow::Error::new(e).context(context).into()),
    }
}

// ── Slug repositories ────────────────────────────────────────────────────────

/// Implements `SlugRepository<$kind>` for `$repo` over the entity module `$entity`.
///
/// Every slug table has the same columns (`id`, `slug`, `created_at`, `updated_at`).
/// Deletion rules differ per table, so `$delete` supplies that step.
macro_rules! slug_repository {
    ($repo:ident, $kind:ty, $entity:ident, $label:literal, delete = $delete:path) => {
        #[derive(Clone)]
        pub struct $repo {
            pub db: DatabaseConnection,
        }

        impl From<$entity::Model> for SlugRecord {
            fn from(model: $entity::Model) -> Self {
                Self {
                    id: model.id,
                    slug: model.slug,
                    created_at: model.created_at,
                    updated_at: model.updated_at,
                }
            }
        }

        impl SlugRepository<$kind> for $repo {
            async fn list(&self) -> Result<Vec<SlugRecord>, AccessServiceError> {
                let models = $entity::Entity::find()
                    .order_by_asc($entity::Column::Id)
                    .all(&self.db)
                    .await
                    .context(concat!("list ", $label, "s"))?;
                Ok(models.into_iter().map(SlugRecord::from).collect())
            }

            async fn find_by_id(&self, id: i32) -> Result<Option<SlugRecord>, AccessServiceError> {
                let model = $entity::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .context(concat!("find ", $label, " by id"))?;
                Ok(model.map(SlugRecord::from))
            }

            async fn find_by_slug(
                &self,
                slug: &str,
            ) -> Result<Option<SlugRecord>, AccessServiceError> {
                let model = $entity::Entity::find()
                    .filter($entity::Column::Slug.eq(slug))
                    .one(&self.db)
                    .await
                    .context(concat!("find ", $label, " by slug"))?;
                Ok(model.map(SlugRecord::from))
            }

            async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<SlugRecord>, AccessServiceError> {
                let models = $entity::Entity::find()
                    .filter($entity::Column::Id.is_in(ids.iter().copied()))
                    .order_by_asc($entity::Column::Id)
                    .all(&self.db)
                    .await
                    .context(concat!("find ", $label, "s by ids"))?;
                Ok(models.into_iter().map(SlugRecord::from).collect())
            }

            async fn create(&self, slug: &str) -> Result<SlugRecord, AccessServiceError> {
                let now = Utc::now();
                let model = $entity::ActiveModel {
                    slug: Set(slug.to_owned()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(|e| {
                    write_error(
                        e,
                        <$kind as SlugKind>::already_exists(),
                        <$kind as SlugKind>::not_found(),
                        concat!("create ", $label),
                    )
                })?;
                Ok(model.into())
            }

            async fn update_slug(
                &self,
                id: i32,
                slug: &str,
            ) -> Result<SlugRecord, AccessServiceError> {
                let model = $entity::ActiveModel {
                    id: Set(id),
                    slug: Set(slug.to_owned()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .update(&self.db)
                .await
                .map_err(|e| {
                    write_error(
                        e,
                        <$kind as SlugKind>::already_exists(),
                        <$kind as SlugKind>::not_found(),
                        concat!("update ", $label, " slug"),
                    )
                })?;
                Ok(model.into())
            }

            async fn delete(&self, id: i32) -> Result<(), AccessServiceError> {
                $delete(&self.db, id).await
            }
        }
    };
}

slug_repository!(DbRoleRepository, RoleKind, roles, "role", delete = delete_role);
slug_repository!(
    DbPermissionRepository,
    PermissionKind,
    permissions,
    "permission",
    delete = delete_permission
);

/// Refuses with `RoleInUse` while any user holds the role. The lookup and the delete share
/// a transaction; the restrict rule on `user_roles.role_id` catches an assignment that
/// commits in between.
async fn delete_role(db: &DatabaseConnection, id: i32) -> Result<(), AccessServiceError> {
    let result = db
        .transaction::<_, (), TxnAbort>(move |txn| {
            Box::pin(async move {
                let assigned = user_roles::Entity::find()
                    .filter(user_roles::Column::RoleId.eq(id))
                    .one(txn)
                    .await?;
                if assigned.is_some() {
                    return Err(TxnAbort::Reject(AccessServiceError::RoleInUse));
                }
                roles::Entity::delete_by_id(id).exec(txn).await?;
                Ok(())
            })
        })
        .await;

    match result {
        Err(TransactionError::Transaction(TxnAbort::Db(e))) if is_foreign_key_violation(&e) => {
            Err(AccessServiceError::RoleInUse)
        }
        other => finish_transaction(other, "delete role"),
    }
}

/// Grants referencing the permission are removed with it.
async fn delete_permission(db: &DatabaseConnection, id: i32) -> Result<(), AccessServiceError> {
    permissions::Entity::delete_by_id(id)
        .exec(db)
        .await
        .context("delete permission")?;
    Ok(())
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn list(&self) -> Result<Vec<User>, AccessServiceError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(user_from_model).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AccessServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn provision(
        &self,
        user: &NewUser,
        role_id: i32,
        permission_ids: &BTreeSet<i32>,
    ) -> Result<Provisioned, AccessServiceError> {
        let user = user.clone();
        let permission_ids = permission_ids.clone();
        let result = self
            .db
            .transaction::<_, Provisioned, TxnAbort>(move |txn| {
                Box::pin(async move {
                    // The user insert is the first write, so a collision there leaves nothing behind.
                    let model = insert_user(txn, &user).await.map_err(|e| {
                        if is_unique_violation(&e) {
                            TxnAbort::Reject(AccessServiceError::EmailAlreadyRegistered)
                        } else {
                            TxnAbort::Db(e)
                        }
                    })?;
                    insert_user_role(txn, model.id, role_id).await?;
                    let new_grants = grant_missing_permissions(txn, role_id, &permission_ids).await?;
                    Ok(Provisioned {
                        user: user_from_model(model),
                        new_grants,
                    })
                })
            })
            .await;

        finish_transaction(result, "provision user")
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, AccessServiceError> {
        let mut am = users::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            am.name = Set(name.clone());
        }
        if let Some(is_active) = changes.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        let model = am.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AccessServiceError::UserNotFound,
            e => anyhow::Error::new(e).context("update user").into(),
        })?;
        Ok(user_from_model(model))
    }

    async fn delete(&self, id: i32) -> Result<(), AccessServiceError> {
        users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }
}

async fn insert_user(txn: &DatabaseTransaction, user: &NewUser) -> Result<users::Model, DbErr> {
    let now = Utc::now();
    users::ActiveModel {
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        is_active: Set(user.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
}

async fn insert_user_role(
    txn: &DatabaseTransaction,
    user_id: i32,
    role_id: i32,
) -> Result<(), DbErr> {
    user_roles::Entity::insert(user_roles::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    })
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

/// Grant `role_id` every requested permission it does not hold yet. Returns the ids
/// that were missing; an empty result means no write was issued.
async fn grant_missing_permissions(
    txn: &DatabaseTransaction,
    role_id: i32,
    requested: &BTreeSet<i32>,
) -> Result<Vec<i32>, DbErr> {
    let existing = role_permissions::Entity::find()
        .filter(role_permissions::Column::RoleId.eq(role_id))
        .filter(role_permissions::Column::PermissionId.is_in(requested.iter().copied()))
        .all(txn)
        .await?;
    let missing = missing_grants(requested, existing.into_iter().map(|rp| rp.permission_id));
    if missing.is_empty() {
        return Ok(missing);
    }
    // A concurrent provisioning for the same role may have granted some of these already.
    role_permissions::Entity::insert_many(missing.iter().map(|&permission_id| {
        role_permissions::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
        }
    }))
    .on_conflict(
        OnConflict::columns([
            role_permissions::Column::RoleId,
            role_permissions::Column::PermissionId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;
    Ok(missing)
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
