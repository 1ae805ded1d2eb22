//! Error taxonomy for the simulation core
//!
//! Generation errors are caught at the generation-task boundary; everything
//! else propagates to the active Place and is handled there.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("area {index} could not be generated: {reason}")]
    Generation { index: usize, reason: String },
    #[error("board index {0} is out of range")]
    InvalidBoardIndex(usize),
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("invalid run record: {0}")]
    Record(String),
    #[error("failed to read/write file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("simulation panicked: {0}")]
    Panicked(String),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn generation(index: usize, reason: impl Into<String>) -> Self {
        Self::Generation {
            index,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an error from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
