//! Island error types.

use thiserror::Error;
use turbo_hydrate::{ConfigError, MountError};

/// Errors raised by islands, the storefront page and its configuration.
#[derive(Error, Debug)]
pub enum IslandError {
    /// Island kind not recognized.
    #[error("Unknown island kind: {0}")]
    UnknownKind(String),

    /// No island with this name on the page.
    #[error("Unknown island: {0}")]
    UnknownIsland(String),

    /// Two islands share a name.
    #[error("Duplicate island name: {0}")]
    DuplicateIsland(String),

    /// The island has not been materialized yet.
    #[error("Island '{0}' is not mounted")]
    NotMounted(String),

    /// The island does not support the action.
    #[error("Island '{island}' has no action '{action}'")]
    UnknownAction { island: String, action: String },

    /// The action argument was malformed.
    #[error("Invalid argument for '{action}': {reason}")]
    InvalidArgument { action: String, reason: String },

    /// Cart entry does not exist.
    #[error("Cart entry not found: {0}")]
    EntryNotFound(usize),

    /// Trigger or mount configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Attaching an eager island failed.
    #[error("Mount error: {0}")]
    Mount(#[from] MountError),

    /// Snapshot serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IslandError {
    pub(crate) fn unknown_action(island: &str, action: &str) -> Self {
        Self::UnknownAction {
            island: island.to_string(),
            action: action.to_string(),
        }
    }

    pub(crate) fn invalid_argument(action: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for island operations.
pub type Result<T> = std::result::Result<T, IslandError>;
