#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Converts the plain fixtures from `oauth-dispatch-test-utils` into crate
//! records, and prepares a PostgreSQL schema when `DATABASE_URL` is set.

#![allow(dead_code)]

use std::sync::Arc;

use oauth_dispatch::{AccessToken, Application, ApplicationId, ExpiryPolicy, MemoryStore, Registry};
use oauth_dispatch_test_utils::{TestApplication, TestToken};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub fn application(fixture: &TestApplication) -> Application {
    Application {
        id: ApplicationId::new(fixture.id),
        client_id: fixture.client_id.clone(),
        name: fixture.name.clone(),
    }
}

pub fn access_token(fixture: &TestToken) -> AccessToken {
    AccessToken {
        id: fixture.id,
        token: fixture.token.clone(),
        application_id: ApplicationId::new(fixture.application_id),
        expires: fixture.expires,
        scope: fixture.scope.clone(),
    }
}

/// In-memory policy with its backing store.
pub fn memory_policy() -> (ExpiryPolicy, Arc<MemoryStore>) {
    oauth_dispatch_test_utils::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let policy = ExpiryPolicy::new(Registry::new(store.clone()), store.clone());
    (policy, store)
}

/// Tables owned by the host authorization server.
const HOST_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS oauth_client (
        id UUID PRIMARY KEY,
        client_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_access_token (
        id UUID PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        application_id UUID NOT NULL REFERENCES oauth_client (id) ON DELETE CASCADE,
        expires TIMESTAMPTZ NOT NULL,
        scope TEXT NOT NULL DEFAULT ''
    )
    "#,
];

/// Connect, create the host tables and apply migrations.
///
/// Returns `None` when `DATABASE_URL` is not set.
pub async fn pg_pool() -> Option<PgPool> {
    oauth_dispatch_test_utils::init_tracing();
    let url = oauth_dispatch_test_utils::database_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to test database");

    // Test binaries run in parallel; serialize the DDL.
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT pg_advisory_xact_lock(7243)")
        .execute(&mut *tx)
        .await
        .unwrap();
    for statement in HOST_SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await.unwrap();
    }
    tx.commit().await.unwrap();
    oauth_dispatch::db::run_migrations(&pool).await.unwrap();

    Some(pool)
}

pub async fn insert_application(pool: &PgPool, fixture: &TestApplication) {
    sqlx::query("INSERT INTO oauth_client (id, client_id, name) VALUES ($1, $2, $3)")
        .bind(fixture.id)
        .bind(&fixture.client_id)
        .bind(&fixture.name)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_token(pool: &PgPool, token: &AccessToken) {
    sqlx::query(
        "INSERT INTO oauth_access_token (id, token, application_id, expires, scope) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(token.id)
    .bind(&token.token)
    .bind(token.application_id)
    .bind(token.expires)
    .bind(&token.scope)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn delete_application(pool: &PgPool, fixture: &TestApplication) {
    sqlx::query("DELETE FROM oauth_client WHERE id = $1")
        .bind(fixture.id)
        .execute(pool)
        .await
        .unwrap();
}
