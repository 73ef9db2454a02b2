//! OAuth client application records.
//!
//! Applications belong to the host authorization server. This crate only
//! reads them to validate references and to label registry entries.

use std::fmt;

use uuid::Uuid;

/// Reference to a registered OAuth client application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<Uuid> for ApplicationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// OAuth client application record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct Application {
    pub id: ApplicationId,
    pub client_id: String,
    pub name: String,
}

impl Application {
    pub fn new(client_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ApplicationId::new(Uuid::now_v7()),
            client_id: client_id.into(),
            name: name.into(),
        }
    }
}
