use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse {0}")]
    Parse(String),
    #[error("invalid argument: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("traversal failed: {0}")]
    TraversalFatal(String),
}

impl GraphError {
    pub fn parse(what: impl Into<String>) -> Self {
        GraphError::Parse(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        GraphError::Validation(what.into())
    }

    pub fn store(what: impl Into<String>) -> Self {
        GraphError::Store(what.into())
    }

    /// HTTP status code this error maps to on the JSON surface.
    pub fn status_code(&self) -> u16 {
        match self {
            GraphError::Parse(_) | GraphError::Validation(_) => 400,
            GraphError::Io(_) | GraphError::Store(_) | GraphError::TraversalFatal(_) => 500,
        }
    }

    /// Stable machine-readable error kind for the `"error"` field of the
    /// JSON error envelope (`SPEC_FULL.md` §6).
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::Io(_) => "io",
            GraphError::Parse(_) => "parse",
            GraphError::Validation(_) => "validation",
            GraphError::Store(_) => "store",
            GraphError::TraversalFatal(_) => "traversal_fatal",
        }
    }
}
