use sea_orm_migration::prelude::*;

mod m20260301_000001_create_roles;
mod m20260301_000002_create_permissions;
mod m20260301_000003_create_users;
mod m20260301_000004_create_user_roles;
mod m20260301_000005_create_role_permissions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_roles::Migration),
            Box::new(m20260301_000002_create_permissions::Migration),
            Box::new(m20260301_000003_create_users::Migration),
            Box::new(m20260301_000004_create_user_roles::Migration),
            Box::new(m20260301_000005_create_role_permissions::Migration),
        ]
    }
}
