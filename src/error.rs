use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before any computation starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input file does not follow the expected CSV layout.
    #[error("invalid data at line {line}: {reason}")]
    Data { line: usize, reason: String },

    /// A broken algorithm invariant. Carries the offending state.
    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn data(line: usize, reason: impl Into<String>) -> Self {
        Error::Data {
            line,
            reason: reason.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}
