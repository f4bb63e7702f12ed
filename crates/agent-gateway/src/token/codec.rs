//! Token issuance and validation.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroize;

use crate::crypto::{derivation, signing};
use crate::error::{GatewayError, Result};
use crate::scope::ScopeSet;

use super::claims::{Claims, Header};
use super::secret::SigningSecret;
use super::{TokenAlgorithm, TokenError};

enum TokenKey {
    Hmac([u8; 32]),
    Ed25519 {
        signing_key: SigningKey,
        verifying_key: VerifyingKey,
    },
}

impl Drop for TokenKey {
    fn drop(&mut self) {
        // SigningKey zeroizes itself
        if let Self::Hmac(key) = self {
            key.zeroize();
        }
    }
}

/// Creates and validates tokens under one signing secret.
///
/// The codec is immutable. Rotating the secret means building a new codec;
/// tokens from the old one then fail signature verification.
pub struct TokenCodec {
    algorithm: TokenAlgorithm,
    key: TokenKey,
}

impl TokenCodec {
    /// Build a codec for `algorithm`, deriving its key from `secret`.
    pub fn new(secret: &SigningSecret, algorithm: TokenAlgorithm) -> Result<Self> {
        let key = match algorithm {
            TokenAlgorithm::Hs256 => TokenKey::Hmac(derivation::derive_key(
                secret.expose(),
                &derivation::hmac_token_context(),
            )?),
            TokenAlgorithm::EdDsa => {
                let signing_key = derivation::derive_signing_key(
                    secret.expose(),
                    &derivation::eddsa_token_context(),
                )?;
                let verifying_key = signing_key.verifying_key();
                TokenKey::Ed25519 {
                    signing_key,
                    verifying_key,
                }
            }
        };
        Ok(Self { algorithm, key })
    }

    /// HS256 codec, the default.
    pub fn hs256(secret: &SigningSecret) -> Result<Self> {
        Self::new(secret, TokenAlgorithm::Hs256)
    }

    pub fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    /// Issue a token for `subject_id` carrying `scopes`, valid for `ttl`.
    pub fn issue(&self, subject_id: &str, scopes: &ScopeSet, ttl: Duration) -> Result<String> {
        self.issue_at(subject_id, scopes, ttl, crate::time::now_secs())
    }

    /// Issue a token as if the current time were `now` (seconds).
    pub fn issue_at(
        &self,
        subject_id: &str,
        scopes: &ScopeSet,
        ttl: Duration,
        now: u64,
    ) -> Result<String> {
        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 {
            return Err(GatewayError::Validation(
                "token lifetime must be at least one second".into(),
            ));
        }
        if subject_id.is_empty() {
            return Err(GatewayError::Validation("token subject is empty".into()));
        }
        let expiry = now
            .checked_add(ttl_secs)
            .ok_or_else(|| GatewayError::Validation("token lifetime overflows".into()))?;

        let claims = Claims {
            subject_id: subject_id.to_string(),
            scopes: scopes.clone(),
            issued_at: now,
            expiry,
        };

        let header = encode_segment(&Header::new(self.algorithm.as_str()))?;
        let payload = encode_segment(&claims)?;
        let signing_input = format!("{header}.{payload}");
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(format!(
            "{signing_input}.{}",
            base64::Engine::encode(&URL_SAFE_NO_PAD, signature)
        ))
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        self.validate_at(token, crate::time::now_secs())
    }

    /// Validate a token as if the current time were `now` (seconds).
    ///
    /// Checks run in a fixed order: the signature over everything before
    /// the last `.`, then the segment structure, then expiry. A token with
    /// no signature segment at all is `Malformed`; any other change to an
    /// issued token is `InvalidSignature`.
    pub fn validate_at(&self, token: &str, now: u64) -> std::result::Result<Claims, TokenError> {
        let (signing_input, signature_b64) =
            token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        let signature = base64::Engine::decode(&URL_SAFE_NO_PAD, signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;
        if !self.verify(signing_input.as_bytes(), &signature) {
            return Err(TokenError::InvalidSignature);
        }

        let (header_b64, claims_b64) = signing_input
            .split_once('.')
            .ok_or(TokenError::Malformed)?;
        if claims_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let header: Header = decode_segment(header_b64)?;
        if header.alg != self.algorithm.as_str() || header.typ != Header::TYP {
            return Err(TokenError::Malformed);
        }

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.subject_id.is_empty() {
            return Err(TokenError::Malformed);
        }

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match &self.key {
            TokenKey::Hmac(key) => signing::hmac_sign(key, message),
            TokenKey::Ed25519 { signing_key, .. } => Ok(signing::ed25519_sign(signing_key, message)),
        }
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match &self.key {
            TokenKey::Hmac(key) => signing::hmac_verify(key, message, signature),
            TokenKey::Ed25519 { verifying_key, .. } => {
                signing::ed25519_verify(verifying_key, message, signature)
            }
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json =
        serde_json::to_vec(value).map_err(|e| GatewayError::Serialization(e.to_string()))?;
    Ok(base64::Engine::encode(&URL_SAFE_NO_PAD, json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> std::result::Result<T, TokenError> {
    let bytes =
        base64::Engine::decode(&URL_SAFE_NO_PAD, segment).map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
