//! The gateway: registration, login and account lifecycle over an
//! injected store.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentProfile, CredentialRecord};
use crate::config::GatewayConfig;
use crate::crypto::PasswordHasher;
use crate::error::{GatewayError, Result};
use crate::scope::{scope_set, ScopePolicy, ScopeSet};
use crate::storage::CredentialStore;
use crate::token::{AccessToken, SigningSecret, TokenCodec};

use super::resolver::{AuthenticatedAgent, SessionResolver};

/// Scope required to deactivate another agent.
pub const ADMIN_SCOPE: &str = "admin";

/// Scope granted when a registration names none.
pub const DEFAULT_SCOPE: &str = "read";

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Input to [`Gateway::register`].
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    /// `None` grants the default `read` scope.
    #[serde(default)]
    pub scopes: Option<ScopeSet>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RegisterRequest {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            scopes: None,
            description: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scope_set(scopes));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let name_len = self.name.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name_len) {
            return Err(GatewayError::Validation(format!(
                "name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters"
            )));
        }
        if self.name.trim().is_empty() {
            return Err(GatewayError::Validation("name is blank".into()));
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(GatewayError::Validation(format!(
                "password must be at least {PASSWORD_MIN_LEN} characters"
            )));
        }
        if let Some(scopes) = &self.scopes {
            if scopes.iter().any(|s| s.trim().is_empty()) {
                return Err(GatewayError::Validation("scope names cannot be blank".into()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("description", &self.description)
            .finish()
    }
}

/// Credential engine for agents.
///
/// Cheap to share behind an `Arc`: every method takes `&self`. The codec
/// sits behind a lock only so that [`rotate_secret`](Self::rotate_secret)
/// can swap it; the lock is held just long enough to clone the `Arc`.
pub struct Gateway<S: CredentialStore> {
    hasher: PasswordHasher,
    codec: RwLock<Arc<TokenCodec>>,
    ttl: Duration,
    store: S,
}

impl<S: CredentialStore> Gateway<S> {
    pub fn new(store: S, hasher: PasswordHasher, codec: TokenCodec, ttl: Duration) -> Self {
        Self {
            hasher,
            codec: RwLock::new(Arc::new(codec)),
            ttl,
            store,
        }
    }

    /// Build a gateway from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` when the secret is missing or the
    /// lifetime or hashing parameters are unusable.
    pub fn from_config(config: &GatewayConfig, store: S) -> Result<Self> {
        config.validate()?;
        let hasher = PasswordHasher::new(config.hasher)?;
        let codec = TokenCodec::new(&config.signing_secret()?, config.algorithm)?;
        Ok(Self::new(store, hasher, codec, config.token_ttl()?))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn token_ttl(&self) -> Duration {
        self.ttl
    }

    /// The codec currently in force.
    pub fn codec(&self) -> Arc<TokenCodec> {
        // The guarded value is a single Arc; a poisoned lock still holds a usable one.
        Arc::clone(&self.codec.read().unwrap_or_else(PoisonError::into_inner))
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Create a new agent.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad name, a short password or a blank scope.
    /// - `Conflict` if the name is taken.
    pub fn register(&self, request: RegisterRequest) -> Result<AgentProfile> {
        request.validate()?;
        let RegisterRequest {
            name,
            password,
            scopes,
            description,
        } = request;

        let scopes = scopes.unwrap_or_else(|| scope_set([DEFAULT_SCOPE]));
        let password_hash = self.hasher.hash(&password)?;
        let record = CredentialRecord::new(name, password_hash, scopes, description);
        let profile = record.profile();

        self.store.insert(record)?;
        log::info!("registered agent {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    // ── Login ─────────────────────────────────────────────────────────────

    /// Exchange a name and password for a bearer token.
    ///
    /// An unknown name and a wrong password both return
    /// `InvalidCredentials`. Liveness is checked only after the password
    /// matches.
    pub fn login(&self, name: &str, password: &str) -> Result<AccessToken> {
        let record = match self.store.find_by_name(name)? {
            Some(record) => record,
            None => {
                self.hasher.dummy_verify(password);
                log::debug!("login for unknown agent name");
                return Err(GatewayError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &record.password_hash) {
            log::debug!("login for agent {} rejected", record.id);
            return Err(GatewayError::InvalidCredentials);
        }

        if !record.active {
            log::debug!("login for deactivated agent {}", record.id);
            return Err(GatewayError::Deactivated);
        }

        self.store
            .update_last_auth(&record.id, crate::time::now_micros())?;

        let token = self
            .codec()
            .issue(record.id.as_str(), &record.scopes, self.ttl)?;
        log::info!("agent {} logged in", record.id);
        Ok(AccessToken::bearer(token, self.ttl.as_secs()))
    }

    // ── Request path ──────────────────────────────────────────────────────

    /// Resolve an `Authorization` header value to a live agent.
    pub fn resolve(&self, authorization: Option<&str>) -> Result<AuthenticatedAgent> {
        let codec = self.codec();
        SessionResolver::new(&codec, &self.store).resolve_header(authorization)
    }

    /// Resolve a bare token to a live agent.
    pub fn resolve_token(&self, token: &str) -> Result<AuthenticatedAgent> {
        let codec = self.codec();
        SessionResolver::new(&codec, &self.store).resolve_token(token)
    }

    /// Gate an operation on the agent's token scopes.
    pub fn authorize(&self, agent: &AuthenticatedAgent, policy: &ScopePolicy) -> Result<()> {
        agent.authorize(policy).map_err(|e| {
            log::debug!("agent {} denied: {e}", agent.id());
            e
        })
    }

    /// The `/me` view of an authenticated agent.
    pub fn profile(&self, agent: &AuthenticatedAgent) -> AgentProfile {
        agent.profile.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Mark an agent inactive. Its outstanding tokens stop resolving.
    pub fn deactivate(&self, id: &AgentId) -> Result<()> {
        self.store.set_active(id, false)?;
        log::info!("deactivated agent {id}");
        Ok(())
    }

    /// Deactivate on behalf of `caller`, who must hold the `admin` scope.
    pub fn deactivate_as(&self, caller: &AuthenticatedAgent, id: &AgentId) -> Result<()> {
        self.authorize(caller, &ScopePolicy::require([ADMIN_SCOPE]))?;
        self.deactivate(id)?;
        log::info!("agent {} deactivated by {}", id, caller.id());
        Ok(())
    }

    pub fn reactivate(&self, id: &AgentId) -> Result<()> {
        self.store.set_active(id, true)?;
        log::info!("reactivated agent {id}");
        Ok(())
    }

    /// Profile of any agent by id.
    pub fn agent(&self, id: &AgentId) -> Result<AgentProfile> {
        self.store
            .find_by_id(id)?
            .map(|record| record.profile())
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    /// All agents, sorted by name.
    pub fn list(&self) -> Result<Vec<AgentProfile>> {
        let mut profiles: Vec<_> = self
            .store
            .list()?
            .iter()
            .map(CredentialRecord::profile)
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    /// Replace the signing secret, keeping the algorithm.
    ///
    /// Every token issued before the call fails validation afterwards.
    pub fn rotate_secret(&self, secret: &SigningSecret) -> Result<()> {
        let algorithm = self.codec().algorithm();
        let codec = Arc::new(TokenCodec::new(secret, algorithm)?);
        *self.codec.write().unwrap_or_else(PoisonError::into_inner) = codec;
        log::info!("signing secret rotated");
        Ok(())
    }
}
