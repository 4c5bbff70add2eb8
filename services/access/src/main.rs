use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use gatekeep_access::config::AccessConfig;
use gatekeep_access::router::build_router;
use gatekeep_access::state::AppState;
use gatekeep_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AccessConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let router = build_router(AppState::new(db));
    let addr = format!("0.0.0.0:{}", config.access_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("access service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
