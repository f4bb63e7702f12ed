//! Message authentication for token signatures.
//!
//! Two schemes, both keyed from the gateway secret:
//! - HMAC-SHA256 (`HS256`), verified in constant time
//! - Ed25519 (`EdDSA`)

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{GatewayError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 tag over `message`.
pub fn hmac_sign(key: &[u8; 32], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| GatewayError::Config(format!("HMAC key: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Check an HMAC-SHA256 tag. The comparison does not exit early on the
/// first differing byte.
pub fn hmac_verify(key: &[u8; 32], message: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

/// Sign a message with an Ed25519 signing key.
pub fn ed25519_sign(signing_key: &SigningKey, message: &[u8]) -> Vec<u8> {
    signing_key.sign(message).to_bytes().to_vec()
}

/// Verify an Ed25519 signature given as raw bytes.
pub fn ed25519_verify(verifying_key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
