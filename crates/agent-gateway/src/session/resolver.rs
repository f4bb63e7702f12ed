//! Turns a bearer token into an authenticated agent.

use crate::agent::{AgentId, AgentProfile};
use crate::error::{GatewayError, Result};
use crate::scope::{ScopePolicy, ScopeSet};
use crate::storage::CredentialStore;
use crate::token::TokenCodec;

/// An agent whose token validated and whose record is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAgent {
    pub profile: AgentProfile,
    /// Scopes carried by the token. These are the scopes granted at
    /// issuance, not the record's current set.
    pub scopes: ScopeSet,
}

impl AuthenticatedAgent {
    pub fn id(&self) -> &AgentId {
        &self.profile.id
    }

    /// Check this agent's token scopes against `policy`.
    pub fn authorize(&self, policy: &ScopePolicy) -> Result<()> {
        policy.check(&self.scopes)
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// Accepts `Bearer <token>` with any casing of the scheme.
pub fn extract_bearer(header: Option<&str>) -> Result<&str> {
    let header = header.map(str::trim).unwrap_or_default();
    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .ok_or(GatewayError::MissingCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GatewayError::MissingCredential);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(GatewayError::MissingCredential);
    }
    Ok(token)
}

/// Read-only request path: validate, look up, check liveness.
pub struct SessionResolver<'a, S: CredentialStore + ?Sized> {
    codec: &'a TokenCodec,
    store: &'a S,
}

impl<'a, S: CredentialStore + ?Sized> SessionResolver<'a, S> {
    pub fn new(codec: &'a TokenCodec, store: &'a S) -> Self {
        Self { codec, store }
    }

    /// Resolve an `Authorization` header value.
    pub fn resolve_header(&self, header: Option<&str>) -> Result<AuthenticatedAgent> {
        self.resolve_token(extract_bearer(header)?)
    }

    /// Resolve a bare token at the current time.
    pub fn resolve_token(&self, token: &str) -> Result<AuthenticatedAgent> {
        self.resolve_token_at(token, crate::time::now_secs())
    }

    /// Resolve a bare token as of `now` (seconds since Unix epoch).
    ///
    /// # Errors
    ///
    /// - `InvalidCredential` if the codec rejects the token.
    /// - `UnknownSubject` if no record has the token's subject id.
    /// - `Deactivated` if the record is inactive.
    /// - `Storage` if the store cannot be read.
    pub fn resolve_token_at(&self, token: &str, now: u64) -> Result<AuthenticatedAgent> {
        let claims = self.codec.validate_at(token, now).map_err(|e| {
            log::debug!("token rejected: {e}");
            GatewayError::InvalidCredential(e)
        })?;

        let subject = AgentId(claims.subject_id);
        let record = self.store.find_by_id(&subject)?.ok_or_else(|| {
            log::debug!("token subject {subject} has no record");
            GatewayError::UnknownSubject
        })?;

        if !record.active {
            log::debug!("token subject {subject} is deactivated");
            return Err(GatewayError::Deactivated);
        }

        Ok(AuthenticatedAgent {
            profile: record.profile(),
            scopes: claims.scopes,
        })
    }
}
