use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use gatekeep_access::domain::repository::{PasswordHasher, SlugRepository, UserRepository};
use gatekeep_access::domain::types::{
    NewUser, PermissionKind, Provisioned, RoleKind, SlugKind, SlugRecord, User, UserChanges,
    missing_grants,
};
use gatekeep_access::error::AccessServiceError;
use gatekeep_access::usecase::user::{CreateUserInput, CreateUserUseCase};
use gatekeep_access_migration::Migrator;

// ── In-memory store ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryDb {
    pub roles: Vec<SlugRecord>,
    pub permissions: Vec<SlugRecord>,
    pub users: Vec<(User, String)>,
    pub user_roles: Vec<(i32, i32)>,
    pub role_permissions: Vec<(i32, i32)>,
    /// Every repository call, reads included.
    pub calls: usize,
    /// Make the grant step of `provision` fail after the user and role rows were staged.
    pub fail_grants: bool,
}

/// Shared handle over one `MemoryDb`, handing out repositories that all see the same rows.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub db: Arc<Mutex<MemoryDb>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_role(&self, slug: &str) -> i32 {
        seed(&mut self.db.lock().unwrap().roles, slug)
    }

    pub fn seed_permission(&self, slug: &str) -> i32 {
        seed(&mut self.db.lock().unwrap().permissions, slug)
    }

    pub fn grant(&self, role_id: i32, permission_id: i32) {
        self.db
            .lock()
            .unwrap()
            .role_permissions
            .push((role_id, permission_id));
    }

    pub fn snapshot(&self) -> MemoryDb {
        self.db.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.db.lock().unwrap().calls
    }

    pub fn fail_grants(&self) {
        self.db.lock().unwrap().fail_grants = true;
    }

    pub fn roles(&self) -> MemorySlugRepo<RoleKind> {
        MemorySlugRepo {
            db: Arc::clone(&self.db),
            kind: PhantomData,
        }
    }

    pub fn permissions(&self) -> MemorySlugRepo<PermissionKind> {
        MemorySlugRepo {
            db: Arc::clone(&self.db),
            kind: PhantomData,
        }
    }

    pub fn users(&self) -> MemoryUserRepo {
        MemoryUserRepo {
            db: Arc::clone(&self.db),
        }
    }

    /// Grants currently held by `role_id`, ascending.
    pub fn grants_of(&self, role_id: i32) -> Vec<i32> {
        let mut grants: Vec<i32> = self
            .snapshot()
            .role_permissions
            .into_iter()
            .filter(|(r, _)| *r == role_id)
            .map(|(_, p)| p)
            .collect();
        grants.sort_unstable();
        grants
    }
}

fn seed(rows: &mut Vec<SlugRecord>, slug: &str) -> i32 {
    let now = Utc::now();
    let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
    rows.push(SlugRecord {
        id,
        slug: slug.to_owned(),
        created_at: now,
        updated_at: now,
    });
    id
}

/// Picks the table backing a slug kind.
pub trait MemoryTable: SlugKind {
    fn rows(db: &mut MemoryDb) -> &mut Vec<SlugRecord>;
}

impl MemoryTable for RoleKind {
    fn rows(db: &mut MemoryDb) -> &mut Vec<SlugRecord> {
        &mut db.roles
    }
}

impl MemoryTable for PermissionKind {
    fn rows(db: &mut MemoryDb) -> &mut Vec<SlugRecord> {
        &mut db.permissions
    }
}

pub struct MemorySlugRepo<K> {
    db: Arc<Mutex<MemoryDb>>,
    kind: PhantomData<K>,
}

impl<K: MemoryTable> MemorySlugRepo<K> {
    fn with_rows<T>(&self, f: impl FnOnce(&mut Vec<SlugRecord>) -> T) -> T {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        f(K::rows(&mut db))
    }
}

impl<K: MemoryTable> SlugRepository<K> for MemorySlugRepo<K> {
    async fn list(&self) -> Result<Vec<SlugRecord>, AccessServiceError> {
        Ok(self.with_rows(|rows| rows.clone()))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<SlugRecord>, AccessServiceError> {
        Ok(self.with_rows(|rows| rows.iter().find(|r| r.id == id).cloned()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SlugRecord>, AccessServiceError> {
        Ok(self.with_rows(|rows| rows.iter().find(|r| r.slug == slug).cloned()))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<SlugRecord>, AccessServiceError> {
        Ok(self.with_rows(|rows| {
            rows.iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect()
        }))
    }

    async fn create(&self, slug: &str) -> Result<SlugRecord, AccessServiceError> {
        self.with_rows(|rows| {
            if rows.iter().any(|r| r.slug == slug) {
                return Err(K::already_exists());
            }
            let id = seed(rows, slug);
            Ok(rows.iter().find(|r| r.id == id).cloned().unwrap())
        })
    }

    async fn update_slug(&self, id: i32, slug: &str) -> Result<SlugRecord, AccessServiceError> {
        self.with_rows(|rows| {
            if rows.iter().any(|r| r.slug == slug && r.id != id) {
                return Err(K::already_exists());
            }
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(K::not_found)?;
            row.slug = slug.to_owned();
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }

    async fn delete(&self, id: i32) -> Result<(), AccessServiceError> {
        self.with_rows(|rows| rows.retain(|r| r.id != id));
        Ok(())
    }
}

pub struct MemoryUserRepo {
    db: Arc<Mutex<MemoryDb>>,
}

impl UserRepository for MemoryUserRepo {
    async fn list(&self) -> Result<Vec<User>, AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        Ok(db.users.iter().map(|(u, _)| u.clone()).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        Ok(db.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        Ok(db
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone()))
    }

    /// Stages every write on a copy and swaps it in only when all steps succeed.
    async fn provision(
        &self,
        user: &NewUser,
        role_id: i32,
        permission_ids: &BTreeSet<i32>,
    ) -> Result<Provisioned, AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        let mut staged = db.clone();

        if staged.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(AccessServiceError::EmailAlreadyRegistered);
        }
        let now = Utc::now();
        let created = User {
            id: staged.users.iter().map(|(u, _)| u.id).max().unwrap_or(0) + 1,
            name: user.name.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        staged
            .users
            .push((created.clone(), user.password_hash.clone()));
        staged.user_roles.push((created.id, role_id));

        if staged.fail_grants {
            return Err(anyhow::anyhow!("grant insert failed").into());
        }
        let existing: Vec<i32> = staged
            .role_permissions
            .iter()
            .filter(|(r, p)| *r == role_id && permission_ids.contains(p))
            .map(|(_, p)| *p)
            .collect();
        let new_grants = missing_grants(permission_ids, existing);
        staged
            .role_permissions
            .extend(new_grants.iter().map(|&p| (role_id, p)));

        *db = staged;
        Ok(Provisioned {
            user: created,
            new_grants,
        })
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<User, AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        let (user, _) = db
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(AccessServiceError::UserNotFound)?;
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), AccessServiceError> {
        let mut db = self.db.lock().unwrap();
        db.calls += 1;
        db.users.retain(|(u, _)| u.id != id);
        db.user_roles.retain(|(u, _)| *u != id);
        Ok(())
    }
}

// ── FakeHasher ───────────────────────────────────────────────────────────────

/// Cheap stand-in for Argon2 that records how often it was asked to hash.
#[derive(Clone, Default)]
pub struct FakeHasher {
    pub calls: Arc<AtomicUsize>,
}

impl FakeHasher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasswordHasher for FakeHasher {
    fn hash_password(&self, password: &str) -> Result<String, AccessServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("fake-hash:{}", password.len()))
    }
}

pub type MemoryCreateUser = CreateUserUseCase<
    MemoryUserRepo,
    MemorySlugRepo<RoleKind>,
    MemorySlugRepo<PermissionKind>,
    FakeHasher,
>;

pub fn create_user_usecase(store: &MemoryStore, hasher: &FakeHasher) -> MemoryCreateUser {
    CreateUserUseCase {
        users: store.users(),
        roles: store.roles(),
        permissions: store.permissions(),
        hasher: hasher.clone(),
    }
}

pub fn create_input(email: &str, role_id: i32, permission_ids: &[i32]) -> CreateUserInput {
    CreateUserInput {
        name: "Ana".into(),
        email: email.into(),
        password: "pw".into(),
        is_active: Some(true),
        role_id: Some(role_id),
        permission_ids: Some(permission_ids.to_vec()),
    }
}

// ── SQLite ───────────────────────────────────────────────────────────────────

/// Fresh in-memory SQLite database with every migration applied.
pub async fn sqlite_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}
