//! Error types for the agent gateway.
//!
//! All errors are strongly typed and propagated without panicking.
//! Secrets, plaintext passwords and password hashes are never included
//! in error messages.

use crate::storage::StoreError;
use crate::token::TokenError;

/// Public message shared by every authentication failure, so that a
/// caller cannot tell an unknown agent from a wrong password or a bad token.
pub const UNAUTHORIZED_MESSAGE: &str = "could not validate credentials";

/// Gateway error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] TokenError),

    #[error("Token subject does not exist")]
    UnknownSubject,

    #[error("Agent has been deactivated")]
    Deactivated,

    #[error("Incorrect agent name or password")]
    InvalidCredentials,

    #[error("Missing required scope: {missing}")]
    InsufficientScope { missing: String },

    #[error("Agent with name '{0}' already exists")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(name) => Self::Conflict(name),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Unavailable(msg) => Self::Storage(msg),
            StoreError::Corrupt(msg) => Self::Storage(msg),
        }
    }
}

/// Externally visible outcome of a failed operation.
///
/// Status-code mapping belongs to the transport layer; these variants only
/// fix which failures must look alike and which must be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unauthorized,
    Forbidden(String),
    Conflict(String),
    BadRequest(String),
    NotFound(String),
    Internal,
}

impl Outcome {
    /// Conventional HTTP status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal => 500,
        }
    }

    /// Message safe to show to the caller.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized => UNAUTHORIZED_MESSAGE,
            Self::Forbidden(msg)
            | Self::Conflict(msg)
            | Self::BadRequest(msg)
            | Self::NotFound(msg) => msg,
            Self::Internal => "internal error",
        }
    }
}

impl GatewayError {
    /// Collapse this error into the outcome a caller is allowed to see.
    ///
    /// Every authentication failure becomes the same `Unauthorized`;
    /// deactivation and conflicts keep their detail.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential(_)
            | Self::UnknownSubject
            | Self::InvalidCredentials => Outcome::Unauthorized,
            Self::Deactivated | Self::InsufficientScope { .. } => {
                Outcome::Forbidden(self.to_string())
            }
            Self::Conflict(_) => Outcome::Conflict(self.to_string()),
            Self::Validation(_) => Outcome::BadRequest(self.to_string()),
            Self::NotFound(_) => Outcome::NotFound(self.to_string()),
            Self::Storage(_) | Self::Config(_) | Self::Serialization(_) | Self::Io(_) => {
                Outcome::Internal
            }
        }
    }

    /// True for conditions that should stop the process rather than be
    /// reported to a single caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Config(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
