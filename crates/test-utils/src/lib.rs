//! oauth-dispatch test utilities.
//!
//! Fixture builders for client applications and issued tokens, plus test
//! logging and database discovery. Fixtures are plain data so they can be
//! loaded into any storage backend.

use std::sync::Once;

use chrono::{DateTime, Duration, Utc};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Honours `RUST_LOG`; defaults to `oauth_dispatch=debug`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("oauth_dispatch=debug,sqlx=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// `DATABASE_URL` from the environment or `.env`, if set.
///
/// PostgreSQL-backed tests skip themselves when this is `None`.
pub fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

/// Create a test client application with a unique client_id.
pub fn test_application(name: &str) -> TestApplication {
    let id = Uuid::now_v7();
    TestApplication {
        id,
        client_id: format!("{name}-{}", id.simple()),
        name: name.to_string(),
    }
}

/// A test client application.
#[derive(Debug, Clone)]
pub struct TestApplication {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
}

impl TestApplication {
    /// Issue a token for this application, expiring in one hour.
    pub fn issue_token(&self) -> TestToken {
        test_token(self.id)
    }
}

/// Create a test token for an application, expiring in one hour.
pub fn test_token(application_id: Uuid) -> TestToken {
    TestToken {
        id: Uuid::now_v7(),
        token: Uuid::new_v4().simple().to_string(),
        application_id,
        expires: Utc::now() + Duration::hours(1),
        scope: "read write".to_string(),
    }
}

/// A test access token builder.
#[derive(Debug, Clone)]
pub struct TestToken {
    pub id: Uuid,
    pub token: String,
    pub application_id: Uuid,
    pub expires: DateTime<Utc>,
    pub scope: String,
}

impl TestToken {
    /// Set an absolute expiry.
    pub fn expiring_at(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = expires;
        self
    }

    /// Expire `ttl` from now.
    pub fn expiring_in(mut self, ttl: Duration) -> Self {
        self.expires = Utc::now() + ttl;
        self
    }
}
