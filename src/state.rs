use std::sync::Arc;
use tokio::sync::RwLock;

use tracing::{info, warn};

use crate::clients::insight::InsightClient;
use crate::config::Config;
use crate::db::Store;
use crate::entities::accounts::Role;
use crate::storage::FileStorage;

/// Long-lived application state, built once at startup and injected into
/// every handler through the router. The store connection is deliberately
/// owned here rather than living in a module-level singleton so tests can
/// substitute their own.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub storage: FileStorage,

    pub insights: Option<Arc<InsightClient>>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let storage = FileStorage::new(&config.storage.uploads_path);
        storage.ensure_dirs().await?;

        seed_admin(&store, &config).await?;

        let insights = if config.ai.enabled {
            Some(Arc::new(InsightClient::new(&config.ai)?))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            storage,
            insights,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}

/// Create the bootstrap admin account from `ADMIN_EMAIL`/`ADMIN_PASSWORD`
/// when both are set and no account holds that email yet.
async fn seed_admin(store: &Store, config: &Config) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"))
    else {
        warn!("ADMIN_EMAIL or ADMIN_PASSWORD not set; skipping admin seeding");
        return Ok(());
    };

    if store.find_account_by_email(&email).await?.is_some() {
        info!("Admin account already exists");
        return Ok(());
    }

    store
        .create_account("Admin", &email, &password, Role::Admin, &config.security)
        .await?;
    info!("Admin account created");

    Ok(())
}
