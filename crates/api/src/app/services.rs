//! Service wiring: pick a store backend and build the catalog engine on it.

use std::sync::Arc;

use stockroom_infra::catalog::{Catalog, TreePolicy};
use stockroom_infra::config::{CatalogConfig, StoreBackend};
use stockroom_infra::store::{CatalogStore, InMemoryCatalogStore};

pub type DynStore = Arc<dyn CatalogStore>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Catalog<DynStore>,
}

impl AppServices {
    pub fn new(store: DynStore, policy: TreePolicy) -> Self {
        Self {
            catalog: Catalog::new(store, policy),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(policy: TreePolicy) -> Self {
        Self::new(Arc::new(InMemoryCatalogStore::new()), policy)
    }
}

pub async fn build_services(config: CatalogConfig) -> anyhow::Result<AppServices> {
    let CatalogConfig { store, policy } = config;

    let services = match store {
        StoreBackend::InMemory => AppServices::in_memory(policy),
        StoreBackend::Postgres(settings) => build_persistent_services(settings, policy).await?,
    };
    tracing::info!(policy = ?services.catalog.policy(), "catalog services ready");
    Ok(services)
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(
    settings: stockroom_infra::config::PostgresSettings,
    policy: TreePolicy,
) -> anyhow::Result<AppServices> {
    use anyhow::Context;
    use stockroom_infra::store::{PostgresCatalogStore, PostgresOptions};

    let options = PostgresOptions {
        database_url: settings.database_url,
        max_connections: settings.max_connections,
        acquire_timeout: settings.acquire_timeout,
    };
    let store = PostgresCatalogStore::connect(&options)
        .await
        .context("failed to connect to Postgres")?;

    tracing::info!(max_connections = options.max_connections, "using Postgres catalog store");
    Ok(AppServices::new(Arc::new(store), policy))
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_services(
    _settings: stockroom_infra::config::PostgresSettings,
    policy: TreePolicy,
) -> anyhow::Result<AppServices> {
    tracing::warn!(
        "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
    );
    Ok(AppServices::in_memory(policy))
}
