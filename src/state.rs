use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::{
    AccountStore, MemoryAccountStore, MemoryProfileStore, MongoAccountStore, MongoDB,
    MongoProfileStore, ProfileStore,
};
use crate::services::{CredentialManager, LoginPolicy, Unthrottled};

/// Shared by every worker. Holds no per-request mutable state; everything
/// durable lives behind the stores.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub credentials: CredentialManager,
    pub login_policy: Arc<dyn LoginPolicy>,
    pub storage_timeout: Duration,
    pub max_image_bytes: usize,
    pub storage_backend: &'static str,
}

impl AppState {
    pub fn with_mongodb(config: &Config, db: &MongoDB) -> Self {
        Self::build(
            config,
            Arc::new(MongoAccountStore::new(db)),
            Arc::new(MongoProfileStore::new(db)),
            "mongodb",
        )
    }

    pub fn in_memory(config: &Config) -> Self {
        Self::build(
            config,
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemoryProfileStore::new()),
            "memory",
        )
    }

    fn build(
        config: &Config,
        accounts: Arc<dyn AccountStore>,
        profiles: Arc<dyn ProfileStore>,
        storage_backend: &'static str,
    ) -> Self {
        Self {
            accounts,
            profiles,
            credentials: CredentialManager::from_config(config),
            login_policy: Arc::new(Unthrottled),
            storage_timeout: config.storage_timeout,
            max_image_bytes: config.max_image_bytes,
            storage_backend,
        }
    }
}
