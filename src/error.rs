use crate::types::{MessageKind, RoundId};

/// Result type for controller operations
pub type GameResult<T> = Result<T, GameError>;

/// User-facing failures of controller operations.
///
/// None of these end the game; the presentation layer shows them as a
/// transient notice and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("Please register your team first")]
    NotRegistered,

    #[error("Please start the timer first")]
    NotStarted,

    #[error("Time is up! No more submissions allowed.")]
    TimeExpired,

    #[error("You have already solved round {0}!")]
    AlreadySolved(RoundId),

    #[error("Please enter a flag")]
    EmptyInput,

    #[error("Timer is already running")]
    AlreadyRunning,

    #[error("Reset already used! You only get one chance per game.")]
    ResetAlreadyUsed,

    #[error("Cannot reset while the game is in progress!")]
    ResetBlocked,

    #[error("Reset cancelled. Incorrect confirmation code.")]
    ResetCancelled,
}

impl GameError {
    /// Stable wire code for the presentation layer
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION_ERROR",
            GameError::NotRegistered => "NOT_REGISTERED",
            GameError::NotStarted => "NOT_STARTED",
            GameError::TimeExpired => "TIME_EXPIRED",
            GameError::AlreadySolved(_) => "ALREADY_SOLVED",
            GameError::EmptyInput => "EMPTY_INPUT",
            GameError::AlreadyRunning => "ALREADY_RUNNING",
            GameError::ResetAlreadyUsed => "RESET_ALREADY_USED",
            GameError::ResetBlocked => "RESET_BLOCKED",
            GameError::ResetCancelled => "RESET_CANCELLED",
        }
    }

    /// Notice category used when showing this error
    pub fn kind(&self) -> MessageKind {
        match self {
            GameError::NotStarted | GameError::AlreadySolved(_) | GameError::AlreadyRunning => {
                MessageKind::Warning
            }
            _ => MessageKind::Error,
        }
    }
}
