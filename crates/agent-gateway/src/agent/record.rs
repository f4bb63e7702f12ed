//! Credential records: the stored form of an agent.

use serde::{Deserialize, Serialize};

use crate::crypto::random::random_bytes;
use crate::scope::ScopeSet;

/// Unique identifier for an agent.
///
/// Format: `agt_` + base58 of 16 random bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let encoded = bs58::encode(random_bytes::<16>()).into_string();
        Self(format!("agt_{encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A registered agent as the store holds it.
///
/// `password_hash` is an opaque PHC string. It is redacted from `Debug`
/// output and absent from [`AgentProfile`].
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: AgentId,
    /// Unique identity name.
    pub name: String,
    pub password_hash: String,
    pub scopes: ScopeSet,
    /// Liveness flag. Inactive agents cannot log in or use tokens.
    pub active: bool,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Last successful login (microseconds since Unix epoch).
    pub last_auth_at: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CredentialRecord {
    /// New active record with a fresh id.
    pub fn new(
        name: impl Into<String>,
        password_hash: String,
        scopes: ScopeSet,
        description: Option<String>,
    ) -> Self {
        Self {
            id: AgentId::generate(),
            name: name.into(),
            password_hash,
            scopes,
            active: true,
            created_at: crate::time::now_micros(),
            last_auth_at: None,
            description,
        }
    }

    /// Public view without the password hash.
    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            scopes: self.scopes.clone(),
            active: self.active,
            created_at: self.created_at,
            last_auth_at: self.last_auth_at,
            description: self.description.clone(),
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .field("last_auth_at", &self.last_auth_at)
            .field("description", &self.description)
            .finish()
    }
}

/// What callers may see about an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub name: String,
    pub scopes: ScopeSet,
    pub active: bool,
    pub created_at: u64,
    pub last_auth_at: Option<u64>,
    pub description: Option<String>,
}
