//! Expiry enforcement for tokens issued to restricted applications.
//!
//! A token issued to a restricted application stays structurally valid but
//! carries an expiry of exactly [`EXPIRY_SENTINEL`] (`1970-01-01T00:00:00Z`).
//! The issuance path calls [`ExpiryPolicy::enforce_on_issue`] (or
//! `is_restricted` followed by `mark_expired`) after all other expiry logic
//! and before persisting the token. Introspection uses `is_marked_expired`,
//! `classify` or `authorize`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{DispatchError, DispatchResult};
use crate::models::{AccessToken, ApplicationId, RestrictedApplication};
use crate::registry::Registry;
use crate::store::TokenStore;

/// Expiry stamped on every token issued to a restricted application.
///
/// External verification compares against this value by exact equality.
pub const EXPIRY_SENTINEL: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Anything carrying an expiry the policy can rewrite.
pub trait Expiring {
    /// Current expiry, or `None` if it cannot be represented as a timestamp.
    fn expires(&self) -> Option<DateTime<Utc>>;

    fn set_expires(&mut self, expires: DateTime<Utc>);
}

/// A token as held by the caller: either the record or its opaque string.
#[derive(Debug, Clone, Copy)]
pub enum TokenRef<'a> {
    Direct(&'a AccessToken),
    ByIdentifier(&'a str),
}

impl<'a> From<&'a AccessToken> for TokenRef<'a> {
    fn from(token: &'a AccessToken) -> Self {
        TokenRef::Direct(token)
    }
}

impl<'a> From<&'a str> for TokenRef<'a> {
    fn from(token: &'a str) -> Self {
        TokenRef::ByIdentifier(token)
    }
}

/// Outcome of [`ExpiryPolicy::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(DenyReason),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Why a token was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The token's application is in the registry.
    RestrictedApplication,
    /// The token carries the sentinel expiry.
    MarkedExpired,
    /// The token identifier did not resolve.
    UnknownToken,
    /// The restriction state could not be determined.
    Unavailable,
}

impl From<&DispatchError> for DenyReason {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::TokenNotFound => DenyReason::UnknownToken,
            _ => DenyReason::Unavailable,
        }
    }
}

/// Result of [`ExpiryPolicy::restrict`].
#[derive(Debug, Clone)]
pub struct Restriction {
    pub entry: RestrictedApplication,
    /// Previously issued tokens whose expiry was rewritten.
    pub tokens_expired: u64,
}

/// Expiry enforcement policy.
#[derive(Clone)]
pub struct ExpiryPolicy {
    registry: Registry,
    tokens: Arc<dyn TokenStore>,
}

impl ExpiryPolicy {
    pub fn new(registry: Registry, tokens: Arc<dyn TokenStore>) -> Self {
        Self { registry, tokens }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether the application has a registry entry.
    pub async fn is_restricted(&self, application_id: ApplicationId) -> DispatchResult<bool> {
        Ok(self.registry.lookup(application_id).await?.is_some())
    }

    /// Stamp the sentinel expiry on a token. Applies no restriction check.
    pub fn mark_expired<T: Expiring + ?Sized>(token: &mut T) {
        token.set_expires(EXPIRY_SENTINEL);
    }

    /// Whether the token's expiry is exactly the sentinel.
    ///
    /// A token that merely expired in the past is not marked.
    pub fn is_marked_expired<T: Expiring + ?Sized>(token: &T) -> bool {
        token.expires() == Some(EXPIRY_SENTINEL)
    }

    /// Whether the token was issued to a restricted application.
    ///
    /// # Errors
    ///
    /// `TokenNotFound` if an identifier does not resolve. An unresolvable
    /// token is never reported as unrestricted.
    pub async fn classify(&self, token: TokenRef<'_>) -> DispatchResult<bool> {
        let application_id = match token {
            TokenRef::Direct(token) => token.application_id,
            TokenRef::ByIdentifier(identifier) => self.resolve(identifier).await?.application_id,
        };
        self.is_restricted(application_id).await
    }

    /// Issuance hook: mark the token expired if its application is restricted.
    ///
    /// Must run after any other expiry-setting logic. Returns whether the
    /// token was marked.
    pub async fn enforce_on_issue<T: Expiring + ?Sized>(
        &self,
        application_id: ApplicationId,
        token: &mut T,
    ) -> DispatchResult<bool> {
        if !self.is_restricted(application_id).await? {
            return Ok(false);
        }
        Self::mark_expired(token);
        debug!(application_id = %application_id, "issued token marked expired");
        Ok(true)
    }

    /// Decide whether a token may be used to call APIs.
    ///
    /// Only the restriction is checked; ordinary expiry, scopes and
    /// revocation stay with the caller. Every error denies.
    pub async fn authorize(&self, token: TokenRef<'_>) -> Access {
        match self.check_access(token).await {
            Ok(access) => access,
            Err(e) => {
                warn!(error = %e, "restriction check failed; denying token");
                Access::Deny(DenyReason::from(&e))
            }
        }
    }

    async fn check_access(&self, token: TokenRef<'_>) -> DispatchResult<Access> {
        let resolved;
        let token = match token {
            TokenRef::Direct(token) => token,
            TokenRef::ByIdentifier(identifier) => {
                resolved = self.resolve(identifier).await?;
                &resolved
            }
        };

        if Self::is_marked_expired(token) {
            return Ok(Access::Deny(DenyReason::MarkedExpired));
        }
        if self.is_restricted(token.application_id).await? {
            // Enforcement did not hold at issuance.
            warn!(
                application_id = %token.application_id,
                token_id = %token.id,
                "unmarked token for restricted application"
            );
            return Ok(Access::Deny(DenyReason::RestrictedApplication));
        }
        Ok(Access::Allow)
    }

    /// Register an application and expire the tokens already issued to it.
    ///
    /// An existing entry is reused, so a call that failed after registering
    /// can be retried to finish the rewrite.
    pub async fn restrict(&self, application_id: ApplicationId) -> DispatchResult<Restriction> {
        let entry = match self.registry.lookup(application_id).await? {
            Some(entry) => entry,
            None => match self.registry.register(application_id).await {
                Ok(entry) => entry,
                // Lost a race with a concurrent registration.
                Err(DispatchError::AlreadyRestricted(_)) => self
                    .registry
                    .lookup(application_id)
                    .await?
                    .ok_or(DispatchError::AlreadyRestricted(application_id))?,
                Err(e) => return Err(e),
            },
        };
        let tokens_expired = self
            .tokens
            .expire_all_for_application(application_id, EXPIRY_SENTINEL)
            .await?;
        info!(
            application_id = %application_id,
            tokens_expired,
            "existing tokens expired for restricted application"
        );
        Ok(Restriction {
            entry,
            tokens_expired,
        })
    }

    /// Stored tokens of a restricted application that lack the sentinel.
    ///
    /// Empty for applications that are not restricted.
    pub async fn unenforced_tokens(
        &self,
        application_id: ApplicationId,
    ) -> DispatchResult<Vec<AccessToken>> {
        if !self.is_restricted(application_id).await? {
            return Ok(Vec::new());
        }
        let tokens = self.tokens.list_for_application(application_id).await?;
        Ok(tokens
            .into_iter()
            .filter(|token| !Self::is_marked_expired(token))
            .collect())
    }

    async fn resolve(&self, identifier: &str) -> DispatchResult<AccessToken> {
        self.tokens
            .find_by_token(identifier)
            .await?
            .ok_or(DispatchError::TokenNotFound)
    }
}

impl std::fmt::Debug for ExpiryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryPolicy").finish()
    }
}
