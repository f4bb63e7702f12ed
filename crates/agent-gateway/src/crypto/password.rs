//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`).
//! Every hash carries its own salt and cost parameters, so records hashed
//! under an older cost keep verifying after the configured cost changes.

use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::crypto::random::{random_bytes, random_salt_16};
use crate::error::{GatewayError, Result};

/// Argon2id cost parameters.
///
/// The defaults (19 MiB, 2 passes, 1 lane) land around 50–150 ms per hash
/// on commodity server hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            m_cost: 19_456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl HasherParams {
    fn to_argon2_params(self) -> Result<Params> {
        Params::new(self.m_cost, self.t_cost, self.p_cost, None)
            .map_err(|e| GatewayError::Config(format!("Argon2 params: {e}")))
    }

    /// Check that argon2 accepts these parameters.
    pub fn validate(&self) -> Result<()> {
        self.to_argon2_params().map(|_| ())
    }
}

/// Salted, deliberately slow one-way password hasher.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Throwaway hash used to equalize the cost of logins for unknown names.
    decoy: String,
}

impl PasswordHasher {
    /// Build a hasher with the given cost parameters.
    ///
    /// Pays for one hash up front to build the decoy, so the first login
    /// for an unknown name costs the same as every later one.
    pub fn new(params: HasherParams) -> Result<Self> {
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            params.to_argon2_params()?,
        );
        let mut hasher = Self {
            argon2,
            decoy: String::new(),
        };
        let filler = bs58::encode(random_bytes::<24>()).into_string();
        hasher.decoy = hasher.hash(&filler)?;
        Ok(hasher)
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::encode_b64(&random_salt_16())
            .map_err(|e| GatewayError::Config(format!("salt encoding: {e}")))?;
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| GatewayError::Config(format!("Argon2 hash: {e}")))?;
        Ok(hash.to_string())
    }

    /// Check a plaintext password against a stored PHC string.
    ///
    /// Never fails: a malformed stored hash is reported as `false`, the same
    /// as a wrong password. The two cases differ only in the log.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("malformed stored hash: {e}");
                return false;
            }
        };

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(PhcError::Password) => {
                log::debug!("password mismatch");
                false
            }
            Err(e) => {
                log::warn!("malformed stored hash: {e}");
                false
            }
        }
    }

    /// Spend one verification against a throwaway hash.
    ///
    /// Login calls this when the name is unknown, so that an unknown name
    /// and a wrong password take the same time.
    pub fn dummy_verify(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.decoy);
    }
}
