use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// every failure is fatal, callers report it and stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// malformed arguments, unreadable input or a configuration that
    /// disagrees with its declared size.
    #[error("configuration error: {0}")]
    Config(String),

    /// the transition table is missing entries or has malformed lines.
    #[error("invalid transition table: {0}")]
    InvalidTable(String),

    #[error("lattice size {size} is not divisible by {workers} workers")]
    IndivisibleSize { size: usize, workers: usize },

    /// a halo round or a coordinator round could not complete.
    #[error("communication failure on worker {rank}: {reason}")]
    CommunicationFailure { rank: usize, reason: String },
}

impl Error {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn invalid_table(reason: impl Into<String>) -> Self {
        Self::InvalidTable(reason.into())
    }

    pub fn communication(rank: usize, reason: impl Into<String>) -> Self {
        Self::CommunicationFailure {
            rank,
            reason: reason.into(),
        }
    }
}
