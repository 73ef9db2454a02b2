//! PostgreSQL storage backend.
//!
//! The registry table is owned by this crate (see `migrations/`). The
//! `oauth_client` and `oauth_access_token` tables belong to the host
//! authorization server and are only read, apart from token expiry updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{RegistryStore, TokenStore};
use crate::error::{DispatchError, DispatchResult};
use crate::models::{AccessToken, ApplicationId, RestrictedApplication};

/// PostgreSQL-backed registry and token store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations on insert to registry errors.
fn map_insert_error(e: sqlx::Error, application_id: ApplicationId) -> DispatchError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return DispatchError::AlreadyRestricted(application_id);
        }
        if db_err.is_foreign_key_violation() {
            return DispatchError::InvalidReference(application_id);
        }
    }
    DispatchError::Database(e)
}

#[async_trait]
impl RegistryStore for PgStore {
    async fn insert(&self, application_id: ApplicationId) -> DispatchResult<RestrictedApplication> {
        let entry = sqlx::query_as::<_, RestrictedApplication>(
            r#"
            WITH inserted AS (
                INSERT INTO oauth_restricted_application (id, application_id)
                VALUES ($1, $2)
                RETURNING id, application_id, created
            )
            SELECT i.id, i.application_id, c.name AS application_name, i.created
            FROM inserted i
            JOIN oauth_client c ON c.id = i.application_id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(application_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, application_id))?;

        Ok(entry)
    }

    async fn find(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Option<RestrictedApplication>> {
        let entry = sqlx::query_as::<_, RestrictedApplication>(
            r#"
            SELECT r.id, r.application_id, c.name AS application_name, r.created
            FROM oauth_restricted_application r
            JOIN oauth_client c ON c.id = r.application_id
            WHERE r.application_id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn delete(&self, application_id: ApplicationId) -> DispatchResult<bool> {
        let result = sqlx::query("DELETE FROM oauth_restricted_application WHERE application_id = $1")
            .bind(application_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> DispatchResult<Vec<RestrictedApplication>> {
        let entries = sqlx::query_as::<_, RestrictedApplication>(
            r#"
            SELECT r.id, r.application_id, c.name AS application_name, r.created
            FROM oauth_restricted_application r
            JOIN oauth_client c ON c.id = r.application_id
            ORDER BY r.created, r.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn find_by_token(&self, token: &str) -> DispatchResult<Option<AccessToken>> {
        // No expiry filter here: restricted tokens are expired by construction
        // and must still resolve.
        let record = sqlx::query_as::<_, AccessToken>(
            "SELECT id, token, application_id, expires, scope FROM oauth_access_token WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_for_application(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Vec<AccessToken>> {
        let tokens = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, token, application_id, expires, scope
            FROM oauth_access_token
            WHERE application_id = $1
            ORDER BY id
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    async fn expire_all_for_application(
        &self,
        application_id: ApplicationId,
        expires: DateTime<Utc>,
    ) -> DispatchResult<u64> {
        let result = sqlx::query(
            "UPDATE oauth_access_token SET expires = $2 WHERE application_id = $1 AND expires <> $2",
        )
        .bind(application_id)
        .bind(expires)
        .execute(&self.pool)
        .await?;

        debug!(
            application_id = %application_id,
            rewritten = result.rows_affected(),
            "rewrote token expiry for application"
        );
        Ok(result.rows_affected())
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").finish()
    }
}
