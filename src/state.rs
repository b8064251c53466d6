use std::sync::Arc;

use crate::auth::{
    jwt::JwtKeys,
    memory::MemoryCredentialStore,
    repo::{CredentialStore, PgCredentialStore},
};
use crate::config::AppConfig;
use crate::db;
use crate::products::{
    memory::MemoryCatalogStore,
    repo::{CatalogStore, PgCatalogStore},
};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub keys: Arc<JwtKeys>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and derives signing keys.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        let credentials = Arc::new(PgCredentialStore::new(pool.clone())) as Arc<dyn CredentialStore>;
        let catalog = Arc::new(PgCatalogStore::new(pool)) as Arc<dyn CatalogStore>;
        Ok(Self::from_parts(credentials, catalog, config))
    }

    pub fn from_parts(
        credentials: Arc<dyn CredentialStore>,
        catalog: Arc<dyn CatalogStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        Self {
            credentials,
            catalog,
            keys,
            config,
        }
    }

    /// Fully in-process state; nothing survives the process.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryCatalogStore::new()),
            Arc::new(config),
        )
    }

    pub fn fake() -> Self {
        Self::in_memory(AppConfig::for_tests("test-secret"))
    }
}
