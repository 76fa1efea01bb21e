use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{
    jwt::JwtKeys, password::CredentialHasher, repo::PgIdentityStore, services::IdentityService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let keys = JwtKeys::from_config(&config.jwt).context("load token signing keys")?;
        let hasher = CredentialHasher::new(&config.hash)?;
        let store = Arc::new(PgIdentityStore::new(db.clone()));
        let identity = Arc::new(IdentityService::new(store, hasher, keys));

        tracing::info!(
            hash_memory_kib = config.hash.memory_kib,
            hash_iterations = config.hash.iterations,
            "identity service ready"
        );

        Ok(Self { db, identity })
    }
}
