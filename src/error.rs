//! Simulation error types

use crate::config::ConfigError;
use crate::platform::BodyHandle;
use crate::sim::GamePhase;

/// Errors raised by the simulation core
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("physics body {0:?} is not registered")]
    MissingBody(BodyHandle),

    #[error("vehicle state became non-finite on tick {tick}")]
    NonFinite { tick: u64 },

    #[error("cannot {action} while in {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: GamePhase,
    },
}
