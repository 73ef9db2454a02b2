//! In-process storage backend.
//!
//! Mirrors the PostgreSQL schema constraints: one registry entry per
//! application, entries must reference a known application, and removing an
//! application cascades to its registry entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{RegistryStore, TokenStore};
use crate::error::{DispatchError, DispatchResult};
use crate::models::{AccessToken, Application, ApplicationId, RestrictedApplication};

/// In-memory registry, application and token store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    applications: DashMap<ApplicationId, Application>,
    restricted: DashMap<ApplicationId, RestrictedApplication>,
    /// Keyed by raw token string.
    tokens: DashMap<String, AccessToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client application so registry entries can reference it.
    pub fn add_application(&self, application: Application) {
        self.applications.insert(application.id, application);
    }

    /// Remove a client application along with its registry entry.
    pub fn remove_application(&self, application_id: ApplicationId) -> Option<Application> {
        // Application first: `insert` holds its guard while adding the entry,
        // so any entry added before this point is cleared below.
        let removed = self
            .applications
            .remove(&application_id)
            .map(|(_, application)| application);
        self.restricted.remove(&application_id);
        removed
    }

    /// Persist an issued token, replacing any token with the same string.
    pub fn save_token(&self, token: AccessToken) {
        self.tokens.insert(token.token.clone(), token);
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn insert(&self, application_id: ApplicationId) -> DispatchResult<RestrictedApplication> {
        // Held until the entry is in place so a concurrent removal cannot
        // slip in between.
        let application = self
            .applications
            .get(&application_id)
            .ok_or(DispatchError::InvalidReference(application_id))?;

        match self.restricted.entry(application_id) {
            Entry::Occupied(_) => Err(DispatchError::AlreadyRestricted(application_id)),
            Entry::Vacant(slot) => {
                let entry = RestrictedApplication {
                    id: Uuid::now_v7(),
                    application_id,
                    application_name: application.name.clone(),
                    created: Utc::now(),
                };
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn find(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Option<RestrictedApplication>> {
        Ok(self
            .restricted
            .get(&application_id)
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, application_id: ApplicationId) -> DispatchResult<bool> {
        Ok(self.restricted.remove(&application_id).is_some())
    }

    async fn list(&self) -> DispatchResult<Vec<RestrictedApplication>> {
        let mut entries: Vec<RestrictedApplication> = self
            .restricted
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn find_by_token(&self, token: &str) -> DispatchResult<Option<AccessToken>> {
        Ok(self.tokens.get(token).map(|record| record.value().clone()))
    }

    async fn list_for_application(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Vec<AccessToken>> {
        let mut tokens: Vec<AccessToken> = self
            .tokens
            .iter()
            .filter(|record| record.application_id == application_id)
            .map(|record| record.value().clone())
            .collect();
        tokens.sort_by_key(|token| token.id);
        Ok(tokens)
    }

    async fn expire_all_for_application(
        &self,
        application_id: ApplicationId,
        expires: DateTime<Utc>,
    ) -> DispatchResult<u64> {
        let mut rewritten = 0;
        for mut record in self.tokens.iter_mut() {
            if record.application_id == application_id && record.expires != expires {
                record.expires = expires;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}
