use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use ducktickets_core::tracing::init_tracing;
use ducktickets_tickets::config::TicketsConfig;
use ducktickets_tickets::router::build_router;
use ducktickets_tickets::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = TicketsConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let state = AppState::new(db, &config);

    let worker = state.outbox_worker(&config);
    tokio::spawn(worker.run());

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("tickets service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server error")?;
    Ok(())
}
