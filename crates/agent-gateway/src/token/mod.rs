//! Signed, time-bounded access tokens.
//!
//! Tokens use the JWT compact form: three `.`-separated segments holding
//! the base64url header, the base64url claims and the base64url signature.
//! The signature covers header and claims, so changing the subject, the
//! scopes or the expiry after issuance breaks it.
//!
//! Rotating the signing secret is the only system-wide revocation lever:
//! a codec built from a new secret rejects every token issued under the
//! old one with [`TokenError::InvalidSignature`].

pub mod claims;
pub mod codec;
pub mod secret;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub use claims::Claims;
pub use codec::TokenCodec;
pub use secret::SigningSecret;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

/// Signature algorithm for issued tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenAlgorithm {
    /// HMAC-SHA256.
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    /// Ed25519.
    #[serde(rename = "EdDSA")]
    EdDsa,
}

impl TokenAlgorithm {
    /// The JOSE `alg` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::EdDsa => "EdDSA",
        }
    }
}

impl FromStr for TokenAlgorithm {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::Hs256),
            "EdDSA" => Ok(Self::EdDsa),
            other => Err(GatewayError::Config(format!(
                "unsupported token algorithm: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TokenAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token handed to an agent after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

impl AccessToken {
    pub(crate) fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}
