//! Key derivation using HKDF-SHA256.
//!
//! The configured signing secret is never used to key a primitive
//! directly. Each token algorithm gets its own key, expanded from the
//! secret under a stable context string.

use ed25519_dalek::SigningKey;
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{GatewayError, Result};

/// Derive a 32-byte key from secret material and a context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the secret as IKM and the context as info.
pub fn derive_key(secret: &[u8], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| GatewayError::Config(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}

/// Derive an Ed25519 signing key from secret material and a context.
pub fn derive_signing_key(secret: &[u8], context: &str) -> Result<SigningKey> {
    let derived = derive_key(secret, context)?;
    Ok(SigningKey::from_bytes(&derived))
}

/// Context for the HMAC-SHA256 token key.
pub fn hmac_token_context() -> String {
    "agent-gateway/token/hs256".to_string()
}

/// Context for the Ed25519 token key.
pub fn eddsa_token_context() -> String {
    "agent-gateway/token/eddsa".to_string()
}
