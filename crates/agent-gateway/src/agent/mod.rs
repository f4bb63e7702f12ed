//! Agent records and their public view.

pub mod record;

pub use record::{AgentId, AgentProfile, CredentialRecord};
