use std::path::PathBuf;

use crate::assets::decode::DecodeError;

pub type SortResult<T> = Result<T, SortError>;

#[derive(thiserror::Error, Debug)]
pub enum SortError {
    #[error("validation error: {0}")]
    Validation(String),

    /// The sequence has no pending items and does not cycle.
    #[error("sequence exhausted: no pending items and cycling is disabled")]
    Exhausted,

    #[error("load error: could not decode '{location}'")]
    Load {
        location: String,
        #[source]
        source: DecodeError,
    },

    #[error("prefetch buffer is empty")]
    BufferEmpty,

    #[error("config error: {}:{line}: {message}", path.display())]
    Config {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("fit error: {0}")]
    Fit(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SortError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }

    pub fn fit(msg: impl Into<String>) -> Self {
        Self::Fit(msg.into())
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}
