use std::error::Error;
use std::fmt::{Debug, Display};

/// Errors reported by [`Trigger`](super::Trigger) and the components built on top of it.
pub enum TimingError {
    /// The trigger was asked to fire every zero time units.
    InvalidInterval,

    /// `stop` or `toggle` was called on a trigger that has no schedule to cancel: it was either
    /// never started or it has already been stopped.
    InvalidState(String),

    /// The operating system refused to create the thread that waits for the next firing.
    Spawn(std::io::Error),
}

impl TimingError {
    pub fn invalid_state<S: Into<String>>(reason: S) -> Self {
        Self::InvalidState(reason.into())
    }
}

impl Debug for TimingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInterval => write!(f, "The firing interval must be longer than zero."),
            Self::InvalidState(reason) => write!(f, "Invalid trigger state: {}", reason),
            Self::Spawn(e) => write!(f, "Cannot spawn the timer thread: {}", e),
        }
    }
}

impl Display for TimingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for TimingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TimingError {
    fn from(e: std::io::Error) -> Self {
        Self::Spawn(e)
    }
}
