//! Agent Gateway: credential engine for AI agents.
//!
//! Agents register with a name and password, log in for a short-lived
//! signed token carrying their scopes, and present that token as a
//! bearer credential. The gateway hashes passwords with Argon2id, issues
//! and validates tokens, resolves tokens back to live agent records and
//! checks scopes against per-operation policies.

pub mod agent;
pub mod config;
pub mod crypto;
pub mod error;
pub mod scope;
pub mod session;
pub mod storage;
pub mod time;
pub mod token;

// Re-export primary types
pub use agent::{AgentId, AgentProfile, CredentialRecord};
pub use config::GatewayConfig;
pub use crypto::{HasherParams, PasswordHasher};
pub use error::{GatewayError, Outcome, Result};
pub use scope::{authorize, scope_set, ScopePolicy, ScopeSet};
pub use session::{AuthenticatedAgent, Gateway, RegisterRequest, SessionResolver};
pub use storage::{CredentialStore, FileStore, MemoryStore, StoreError};
pub use token::{AccessToken, Claims, SigningSecret, TokenAlgorithm, TokenCodec, TokenError};
