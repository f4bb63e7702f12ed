//! Gateway configuration.
//!
//! Loaded from environment variables or from a JSON file. The signing
//! secret has no default; a configuration without one does not validate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::HasherParams;
use crate::error::{GatewayError, Result};
use crate::token::{SigningSecret, TokenAlgorithm};

pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
pub const ENV_ALGORITHM: &str = "ALGORITHM";
pub const ENV_EXPIRE_MINUTES: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const ENV_HASH_M_COST: &str = "HASH_M_COST";
pub const ENV_HASH_T_COST: &str = "HASH_T_COST";
pub const ENV_HASH_P_COST: &str = "HASH_P_COST";
pub const ENV_DATA_DIR: &str = "AGENT_GATEWAY_DIR";

const DEFAULT_EXPIRE_MINUTES: u64 = 30;

/// Everything needed to build a [`Gateway`](crate::Gateway).
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Signing secret. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub secret_key: String,

    #[serde(default)]
    pub algorithm: TokenAlgorithm,

    #[serde(default = "default_expire_minutes")]
    pub access_token_expire_minutes: u64,

    #[serde(default)]
    pub hasher: HasherParams,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_expire_minutes() -> u64 {
    DEFAULT_EXPIRE_MINUTES
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".agent-gateway")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: TokenAlgorithm::default(),
            access_token_expire_minutes: DEFAULT_EXPIRE_MINUTES,
            hasher: HasherParams::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl GatewayConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secret) = lookup(ENV_SECRET_KEY) {
            config.secret_key = secret;
        }
        if let Some(alg) = lookup(ENV_ALGORITHM) {
            config.algorithm = alg.trim().parse()?;
        }
        if let Some(minutes) = lookup(ENV_EXPIRE_MINUTES) {
            config.access_token_expire_minutes = parse_number(ENV_EXPIRE_MINUTES, &minutes)?;
        }
        if let Some(m) = lookup(ENV_HASH_M_COST) {
            config.hasher.m_cost = parse_number(ENV_HASH_M_COST, &m)?;
        }
        if let Some(t) = lookup(ENV_HASH_T_COST) {
            config.hasher.t_cost = parse_number(ENV_HASH_T_COST, &t)?;
        }
        if let Some(p) = lookup(ENV_HASH_P_COST) {
            config.hasher.p_cost = parse_number(ENV_HASH_P_COST, &p)?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Load a JSON config file. A `SECRET_KEY` in the environment
    /// overrides an absent `secret_key` in the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&data).map_err(|e| {
            GatewayError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        if config.secret_key.is_empty() {
            if let Ok(secret) = std::env::var(ENV_SECRET_KEY) {
                config.secret_key = secret;
            }
        }
        Ok(config)
    }

    /// Reject configurations the gateway cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            return Err(GatewayError::Config(format!(
                "{ENV_SECRET_KEY} is not set"
            )));
        }
        if self.access_token_expire_minutes == 0 {
            return Err(GatewayError::Config(
                "access token lifetime must be at least one minute".into(),
            ));
        }
        self.token_ttl()?;
        self.hasher.validate()
    }

    pub fn signing_secret(&self) -> Result<SigningSecret> {
        SigningSecret::from_str_secret(&self.secret_key)
    }

    pub fn token_ttl(&self) -> Result<Duration> {
        self.access_token_expire_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| GatewayError::Config("access token lifetime overflows".into()))
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("hasher", &self.hasher)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| GatewayError::Config(format!("{key} is not a valid number: {raw:?}")))
}
