use crate::auth::{
    jwt::TokenService,
    repo::{MemoryUserRepository, PgUserRepository, UserRepository},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::items::repo::{ItemRepository, MemoryItemRepository, PgItemRepository};
use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub items: Arc<dyn ItemRepository>,
    /// Present when running against Postgres.
    pub db: Option<PgPool>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let Some(url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            return Ok(Self::in_memory(config));
        };

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connect to database")?;

        Ok(Self::from_parts(
            config,
            db.clone(),
            Arc::new(PgUserRepository::new(db.clone())),
            Arc::new(PgItemRepository::new(db)),
        ))
    }

    fn from_parts(
        config: Arc<AppConfig>,
        db: PgPool,
        users: Arc<dyn UserRepository>,
        items: Arc<dyn ItemRepository>,
    ) -> Self {
        let auth = AuthService::new(users, TokenService::new(&config.jwt));
        Self {
            config,
            auth,
            items,
            db: Some(db),
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let users = Arc::new(MemoryUserRepository::new()) as Arc<dyn UserRepository>;
        let items = Arc::new(MemoryItemRepository::new()) as Arc<dyn ItemRepository>;
        let auth = AuthService::new(users, TokenService::new(&config.jwt));
        Self {
            config,
            auth,
            items,
            db: None,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test-secret-test-secret-test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
        });
        Self::in_memory(config)
    }
}
