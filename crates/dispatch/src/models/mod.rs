//! Records read and written by the registry and the expiry policy.

pub mod access_token;
pub mod application;
pub mod restricted_application;

pub use access_token::AccessToken;
pub use application::{Application, ApplicationId};
pub use restricted_application::RestrictedApplication;
