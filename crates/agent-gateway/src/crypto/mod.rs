//! Cryptographic primitives for the agent gateway.
//!
//! This module provides:
//! - Argon2id password hashing and verification
//! - HKDF-SHA256 derivation of token keys from the gateway secret
//! - HMAC-SHA256 and Ed25519 token signatures
//! - Cryptographically secure random number generation

pub mod derivation;
pub mod password;
pub mod random;
pub mod signing;

pub use password::{HasherParams, PasswordHasher};
