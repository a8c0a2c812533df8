use pathrace_core::Error;
use thiserror::Error;

use crate::round::RoundPhase;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoundError {
    #[error(transparent)]
    Core(#[from] Error),
    #[error("Cannot {action} during the {phase} phase")]
    WrongPhase {
        action: &'static str,
        phase: RoundPhase,
    },
    #[error("Start and end must be selected first")]
    MissingEndpoints,
    #[error("Round aborted after {frames} frames")]
    Aborted { frames: usize },
}
