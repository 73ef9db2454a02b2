//! Restricted application registry.
//!
//! A durable membership set answering "is this application restricted?".
//! Absence is the normal case and is reported as `None`, never as an error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DispatchResult;
use crate::models::{ApplicationId, RestrictedApplication};
use crate::store::RegistryStore;

/// Registry of restricted client applications.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RegistryStore>,
}

impl Registry {
    /// Create a registry over a storage backend.
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// Mark an application as restricted.
    ///
    /// # Errors
    ///
    /// `AlreadyRestricted` if the application already has an entry,
    /// `InvalidReference` if the application does not exist.
    pub async fn register(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<RestrictedApplication> {
        let entry = self.store.insert(application_id).await?;
        info!(
            application_id = %application_id,
            application = %entry.application_name,
            "application restricted"
        );
        Ok(entry)
    }

    /// Get the registry entry for an application, if any.
    pub async fn lookup(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Option<RestrictedApplication>> {
        let entry = self.store.find(application_id).await?;
        debug!(
            application_id = %application_id,
            restricted = entry.is_some(),
            "restricted application lookup"
        );
        Ok(entry)
    }

    /// Lift the restriction on an application. A no-op if it has none.
    ///
    /// Returns whether an entry was removed.
    pub async fn unregister(&self, application_id: ApplicationId) -> DispatchResult<bool> {
        let removed = self.store.delete(application_id).await?;
        if removed {
            info!(application_id = %application_id, "application restriction lifted");
        }
        Ok(removed)
    }

    /// All restricted applications, oldest first.
    pub async fn list(&self) -> DispatchResult<Vec<RestrictedApplication>> {
        self.store.list().await
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::models::Application;
    use crate::store::MemoryStore;

    fn registry_with(names: &[&str]) -> (Registry, Vec<ApplicationId>) {
        let store = MemoryStore::new();
        let ids = names
            .iter()
            .map(|name| {
                let application = Application::new(format!("{name}-client"), *name);
                let id = application.id;
                store.add_application(application);
                id
            })
            .collect();
        (Registry::new(Arc::new(store)), ids)
    }

    #[tokio::test]
    async fn lookup_of_unregistered_is_none() {
        let (registry, ids) = registry_with(&["plain"]);
        assert!(registry.lookup(ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_then_lookup() {
        let (registry, ids) = registry_with(&["restricted"]);
        let entry = registry.register(ids[0]).await.unwrap();

        let found = registry.lookup(ids[0]).await.unwrap().unwrap();
        assert_eq!(found, entry);
        assert_eq!(found.application_name, "restricted");
    }

    #[tokio::test]
    async fn register_twice_fails() {
        let (registry, ids) = registry_with(&["twice"]);
        registry.register(ids[0]).await.unwrap();

        let err = registry.register(ids[0]).await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyRestricted(_)));
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let (registry, ids) = registry_with(&["gone"]);
        registry.register(ids[0]).await.unwrap();

        assert!(registry.unregister(ids[0]).await.unwrap());
        assert!(!registry.unregister(ids[0]).await.unwrap());
        assert!(registry.lookup(ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_registration_order() {
        let (registry, ids) = registry_with(&["one", "two", "three"]);
        for id in &ids {
            registry.register(*id).await.unwrap();
        }

        let listed: Vec<ApplicationId> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.application_id)
            .collect();
        assert_eq!(listed, ids);
    }
}
