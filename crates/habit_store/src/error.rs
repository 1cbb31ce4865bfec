use std::path::PathBuf;

use habit_core::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{document} is not valid JSON: {source}")]
    Json {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{document} record {index} is invalid: {reason}")]
    InvalidRecord {
        document: &'static str,
        index: usize,
        reason: String,
    },
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(document: &'static str, index: usize, reason: impl Into<String>) -> Self {
        StoreError::InvalidRecord {
            document,
            index,
            reason: reason.into(),
        }
    }
}
