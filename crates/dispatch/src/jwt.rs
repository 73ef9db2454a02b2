//! JWT payloads for restricted applications.
//!
//! The authorization server can hand out a JWT alongside the opaque access
//! token. For a restricted application the payload's `exp` is the sentinel
//! in Unix seconds, i.e. `0`. Standard validation rejects such a JWT as
//! expired, which cannot be told apart from ordinary expiry, so
//! [`JwtInspector`] decodes without the expiry check.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::error::DispatchResult;
use crate::policy::{Expiring, ExpiryPolicy};

/// JWT token claims.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JwtClaims {
    /// Issuer.
    pub iss: String,
    /// Subject (user ID, or client_id for client_credentials).
    pub sub: String,
    /// Audience (client ID).
    pub aud: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// JWT ID.
    pub jti: String,
    /// Client ID that requested the token.
    pub client_id: String,
    /// Scopes granted.
    pub scope: String,
    /// Token type: "access" or "refresh".
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "access".to_string()
}

impl Expiring for JwtClaims {
    fn expires(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }

    fn set_expires(&mut self, expires: DateTime<Utc>) {
        self.exp = expires.timestamp();
    }
}

/// Decodes HS256 JWTs, checking signature and issuer but not expiry.
#[derive(Clone)]
pub struct JwtInspector {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtInspector {
    /// Create an inspector for JWTs signed with `secret` by `issuer`.
    pub fn new(secret: &[u8], issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.validate_aud = false;
        validation.validate_exp = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Decode and verify a JWT, returning its claims even if expired.
    ///
    /// # Errors
    ///
    /// `InvalidJwt` for malformed tokens, bad signatures or a wrong issuer.
    pub fn inspect(&self, token: &str) -> DispatchResult<JwtClaims> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Whether a JWT carries the restriction sentinel as its expiry.
    pub fn is_marked_expired(&self, token: &str) -> DispatchResult<bool> {
        let claims = self.inspect(token)?;
        Ok(ExpiryPolicy::is_marked_expired(&claims))
    }
}

impl std::fmt::Debug for JwtInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtInspector").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::error::DispatchError;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long!!";
    const ISSUER: &str = "oauth-dispatch-test";

    fn claims(exp: i64) -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            iss: ISSUER.to_string(),
            sub: "user-1".to_string(),
            aud: "client-1".to_string(),
            iat: now,
            exp,
            jti: uuid::Uuid::now_v7().to_string(),
            client_id: "client-1".to_string(),
            scope: "read".to_string(),
            token_type: "access".to_string(),
        }
    }

    fn encode(claims: &JwtClaims, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("encoding failed")
    }

    #[test]
    fn marking_claims_sets_exp_to_zero() {
        let mut c = claims(Utc::now().timestamp() + 3600);
        ExpiryPolicy::mark_expired(&mut c);
        assert_eq!(c.exp, 0);
        assert!(ExpiryPolicy::is_marked_expired(&c));
    }

    #[test]
    fn marked_jwt_is_recognised() {
        let mut c = claims(Utc::now().timestamp() + 3600);
        ExpiryPolicy::mark_expired(&mut c);
        let token = encode(&c, SECRET);

        let inspector = JwtInspector::new(SECRET, ISSUER);
        assert!(inspector.is_marked_expired(&token).unwrap());
        assert_eq!(inspector.inspect(&token).unwrap(), c);
    }

    #[test]
    fn ordinarily_expired_jwt_is_not_marked() {
        let token = encode(&claims(Utc::now().timestamp() - 3600), SECRET);
        let inspector = JwtInspector::new(SECRET, ISSUER);
        assert!(!inspector.is_marked_expired(&token).unwrap());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = encode(&claims(0), b"another-secret-key-at-least-32-bytes!!");
        let inspector = JwtInspector::new(SECRET, ISSUER);
        let err = inspector.is_marked_expired(&token).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidJwt(_)));
    }

    #[test]
    fn wrong_issuer_rejected() {
        let mut c = claims(0);
        c.iss = "someone-else".to_string();
        let token = encode(&c, SECRET);
        let inspector = JwtInspector::new(SECRET, ISSUER);
        assert!(inspector.inspect(&token).is_err());
    }

    #[test]
    fn token_type_defaults_to_access() {
        let json = serde_json::json!({
            "iss": ISSUER, "sub": "s", "aud": "a", "iat": 0, "exp": 0,
            "jti": "j", "client_id": "c", "scope": ""
        });
        let c: JwtClaims = serde_json::from_value(json).unwrap();
        assert_eq!(c.token_type, "access");
    }
}
