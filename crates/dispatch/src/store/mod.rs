//! Storage backends for the registry and for token lookups.
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] keeps everything
//! in process and is used by tests and embedders without a database.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DispatchResult;
use crate::models::{AccessToken, ApplicationId, RestrictedApplication};

/// Durable set of restricted application entries.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Insert an entry for `application_id`.
    ///
    /// Fails with `AlreadyRestricted` when an entry exists and with
    /// `InvalidReference` when the application does not.
    async fn insert(&self, application_id: ApplicationId) -> DispatchResult<RestrictedApplication>;

    /// Find the entry for `application_id`.
    async fn find(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Option<RestrictedApplication>>;

    /// Delete the entry for `application_id`. Returns whether one existed.
    async fn delete(&self, application_id: ApplicationId) -> DispatchResult<bool>;

    /// All entries, oldest first.
    async fn list(&self) -> DispatchResult<Vec<RestrictedApplication>>;
}

/// Read access to tokens issued by the authorization server, plus the
/// expiry rewrite used when an application becomes restricted.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Resolve an opaque token string to its record.
    async fn find_by_token(&self, token: &str) -> DispatchResult<Option<AccessToken>>;

    /// All stored tokens issued to `application_id`.
    async fn list_for_application(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Vec<AccessToken>>;

    /// Set `expires` on every token of `application_id` that does not already
    /// carry it. Returns the number of tokens rewritten.
    async fn expire_all_for_application(
        &self,
        application_id: ApplicationId,
        expires: DateTime<Utc>,
    ) -> DispatchResult<u64>;
}
