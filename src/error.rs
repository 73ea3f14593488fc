use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// Anything a strategy raised while fetching: network, DNS, TLS, browser driver.
    #[error("{0}")]
    Transport(String),

    #[error("timed out after {:.0} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("could not save result: {0}")]
    Persistence(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("strategy registered twice: {0}")]
    DuplicateStrategy(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn transport(message: impl Into<String>) -> Self {
        ProbeError::Transport(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        ProbeError::Persistence(message.into())
    }
}
