use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for the intake core. Every variant has a defined recovery:
/// none of these is fatal to the surrounding session.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntakeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No availability for the requested doctor")]
    NoAvailability,

    #[error("Slot was taken by a concurrent booking")]
    SlotConflict,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
