//! Restricted OAuth2 applications.
//!
//! A registry of client applications flagged as restricted, and the expiry
//! policy that hands every token issued to them out already expired: its
//! expiry is pinned to `1970-01-01T00:00:00Z`, so it stays structurally
//! valid but cannot be used to call APIs.

pub mod config;
pub mod db;
pub mod error;
pub mod jwt;
pub mod models;
pub mod policy;
pub mod registry;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{DispatchError, DispatchResult};
pub use jwt::{JwtClaims, JwtInspector};
pub use models::{AccessToken, Application, ApplicationId, RestrictedApplication};
pub use policy::{
    Access, DenyReason, EXPIRY_SENTINEL, Expiring, ExpiryPolicy, Restriction, TokenRef,
};
pub use registry::Registry;
pub use state::DispatchState;
pub use store::{MemoryStore, PgStore, RegistryStore, TokenStore};
