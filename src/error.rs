use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("gadget not ready: {0}")]
    NotReady(String),

    #[error("operation would block")]
    WouldBlock,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error is the retryable non-blocking signal.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::WouldBlock)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
