//! Restricted application registry entries.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ApplicationId;

/// A client application marked as restricted.
///
/// Tokens issued to a restricted application are only ever handed out
/// already expired, so they cannot be used to call APIs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct RestrictedApplication {
    pub id: Uuid,
    pub application_id: ApplicationId,
    /// Name of the referenced application, joined in on load.
    pub application_name: String,
    pub created: DateTime<Utc>,
}

impl fmt::Display for RestrictedApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RestrictedApplication '{}'>", self.application_name)
    }
}
