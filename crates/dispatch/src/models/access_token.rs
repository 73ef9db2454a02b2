//! Access token records issued by the host authorization server.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ApplicationId;
use crate::policy::Expiring;

/// Access token record.
///
/// Token lifecycle belongs to the authorization server. The expiry policy
/// only reads `application_id` and rewrites `expires`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: Uuid,
    #[serde(skip)]
    pub token: String,
    pub application_id: ApplicationId,
    pub expires: DateTime<Utc>,
    pub scope: String,
}

impl AccessToken {
    pub fn new(
        token: impl Into<String>,
        application_id: ApplicationId,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            token: token.into(),
            application_id,
            expires,
            scope: String::new(),
        }
    }
}

impl Expiring for AccessToken {
    fn expires(&self) -> Option<DateTime<Utc>> {
        Some(self.expires)
    }

    fn set_expires(&mut self, expires: DateTime<Utc>) {
        self.expires = expires;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn raw_token_is_never_serialized() {
        let mut token =
            AccessToken::new("s3cr3t-token", ApplicationId::new(Uuid::nil()), Utc::now());
        token.scope = "read".to_string();
        let json = serde_json::to_string(&token).unwrap();
        assert!(!json.contains("s3cr3t-token"));
        assert!(json.contains("\"scope\":\"read\""));
    }
}
