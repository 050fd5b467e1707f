mod app;
mod auth;
mod config;
mod items;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "freemarket=debug,axum=info,tower_http=info".to_string());
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

    // A missing or weak signing secret stops the process here.
    let config = AppConfig::from_env()?;
    tracing::info!(
        ttl_minutes = config.jwt.ttl_minutes,
        issuer = %config.jwt.issuer,
        "auth configured"
    );

    let app_state = AppState::init(config).await?;

    if let Some(db) = &app_state.db {
        sqlx::migrate!("./migrations")
            .run(db)
            .await
            .map_err(|e| anyhow::anyhow!("migrations failed: {}", e))?;
    }

    let config = app_state.config.clone();
    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
