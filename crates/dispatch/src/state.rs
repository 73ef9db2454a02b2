//! Wiring of the registry and policy over PostgreSQL.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::policy::ExpiryPolicy;
use crate::registry::Registry;
use crate::store::PgStore;

/// Shared dispatch state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct DispatchState {
    inner: Arc<DispatchStateInner>,
}

struct DispatchStateInner {
    db: PgPool,
    policy: ExpiryPolicy,
}

impl DispatchState {
    /// Connect to PostgreSQL, apply migrations and build the policy.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let state = Self::from_pool(db);
        info!("restricted application registry ready");
        Ok(state)
    }

    /// Build state over an existing pool. Migrations are not run.
    pub fn from_pool(db: PgPool) -> Self {
        let store = Arc::new(PgStore::new(db.clone()));
        let registry = Registry::new(store.clone());
        let policy = ExpiryPolicy::new(registry, store);

        Self {
            inner: Arc::new(DispatchStateInner { db, policy }),
        }
    }

    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn registry(&self) -> &Registry {
        self.inner.policy.registry()
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.inner.policy
    }
}

impl std::fmt::Debug for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchState").finish()
    }
}
