//! Token claims and header.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeSet;

/// Decoded token payload.
///
/// Field names on the wire follow JWT registered claims (`sub`, `iat`,
/// `exp`); timestamps are whole seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the credential record the token was issued to.
    #[serde(rename = "sub")]
    pub subject_id: String,
    /// Scopes granted at issuance time.
    pub scopes: ScopeSet,
    /// Issuance time.
    #[serde(rename = "iat")]
    pub issued_at: u64,
    /// Absolute expiry. The token is expired at this instant.
    #[serde(rename = "exp")]
    pub expiry: u64,
}

impl Claims {
    /// Is the token expired at `now`?
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expiry
    }

    /// Seconds of validity left at `now`.
    pub fn remaining_at(&self, now: u64) -> u64 {
        self.expiry.saturating_sub(now)
    }
}

/// JOSE header of a compact token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Header {
    pub alg: String,
    pub typ: String,
}

impl Header {
    pub(crate) const TYP: &'static str = "JWT";

    pub(crate) fn new(alg: &str) -> Self {
        Self {
            alg: alg.to_string(),
            typ: Self::TYP.to_string(),
        }
    }
}
