use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(gatekeep_access_migration::Migrator).await;
}
