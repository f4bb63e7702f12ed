//! Agent sessions: the per-request resolver and the gateway operations
//! built on it.
//!
//! [`SessionResolver`] is the read-only request path. [`Gateway`] owns the
//! hasher, the current codec and the store, and exposes registration,
//! login, lifecycle and secret rotation.

pub mod resolver;
pub mod service;

pub use resolver::{extract_bearer, AuthenticatedAgent, SessionResolver};
pub use service::{Gateway, RegisterRequest, ADMIN_SCOPE, DEFAULT_SCOPE};
