//! Error types for deferred activation.

use thiserror::Error;

/// Errors raised while configuring a deferred controller.
///
/// These fail immediately at configure time and are never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A timer trigger was configured without a delay.
    #[error("Timer trigger requires timer_delay_ms")]
    MissingTimerDelay,

    /// The timer delay was negative or not an integer.
    #[error("Invalid timer delay: {0}")]
    InvalidTimerDelay(String),

    /// The trigger kind is not one of interaction, viewport or timer.
    #[error("Unknown trigger kind: {0}")]
    UnknownTrigger(String),

    /// The mount point already holds a unit.
    #[error("Mount point '{0}' is already occupied")]
    MountOccupied(String),

    /// Another controller owns (or has already fired on) the mount point.
    #[error("Mount point '{0}' is already claimed by a controller")]
    MountClaimed(String),

    /// The mount point has been torn down.
    #[error("Mount point '{0}' has been destroyed")]
    MountDestroyed(String),
}

/// Errors raised when attaching a unit to a mount point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// The mount point already holds a unit.
    #[error("Mount point '{0}' is already occupied")]
    Occupied(String),

    /// The mount point has been torn down.
    #[error("Mount point '{0}' has been destroyed")]
    Destroyed(String),
}

/// Umbrella error for the activation lifecycle.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Attaching the produced unit failed.
    #[error("Mount error: {0}")]
    Mount(#[from] MountError),

    /// The factory failed to produce a unit.
    #[error("Materialization failed: {0:#}")]
    Materialize(#[from] anyhow::Error),

    /// The mount point went away before the unit was attached.
    #[error("Mount point '{0}' was torn down before activation")]
    TornDown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_keeps_context_chain() {
        let err = ActivationError::from(anyhow::anyhow!("chunk 404").context("load cart chunk"));
        assert_eq!(
            err.to_string(),
            "Materialization failed: load cart chunk: chunk 404"
        );
    }

    #[test]
    fn test_mount_error_converts() {
        let err = ActivationError::from(MountError::Occupied("cart".to_string()));
        assert!(matches!(err, ActivationError::Mount(MountError::Occupied(_))));
    }
}
