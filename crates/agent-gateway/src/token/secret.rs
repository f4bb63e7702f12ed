//! The process-wide signing secret.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{GatewayError, Result};

/// Secret material every token key is derived from.
///
/// Zeroized on drop and never printed. Replacing it invalidates every
/// token issued under the previous value.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap raw secret bytes. Empty input is rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(GatewayError::Config("signing secret is empty".into()));
        }
        Ok(Self(bytes))
    }

    /// Wrap a UTF-8 secret, such as one read from the environment.
    pub fn from_str_secret(secret: &str) -> Result<Self> {
        Self::new(secret.as_bytes().to_vec())
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}
