//! Dispatch error types.

use thiserror::Error;

use crate::models::ApplicationId;

/// Errors raised by the registry and the expiry policy.
///
/// None of these are transient. Callers deciding access on a token must
/// treat every variant as a denial.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("access token not found")]
    TokenNotFound,

    #[error("application {0} is already restricted")]
    AlreadyRestricted(ApplicationId),

    #[error("application {0} does not exist")]
    InvalidReference(ApplicationId),

    #[error("invalid JWT: {0}")]
    InvalidJwt(#[from] jsonwebtoken::errors::Error),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias using DispatchError.
pub type DispatchResult<T> = Result<T, DispatchError>;
