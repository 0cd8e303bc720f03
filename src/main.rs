mod app;
mod auth;
mod config;
mod db;
mod error;
mod sessions;
mod state;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accounts_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (state, pool) = AppState::init(config).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let server_cfg = state.config.server.clone();
    let app = app::build_app(state);
    app::serve(app, &server_cfg).await?;

    pool.close().await;
    Ok(())
}
