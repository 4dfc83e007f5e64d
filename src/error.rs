use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("expected 2 comma separated values, found {fields}")]
    Format { fields: usize },

    #[error("{action} {path}: {source}", path = .path.display())]
    FileSystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wallpaper helper '{program}' failed: {reason}")]
    Subprocess { program: String, reason: String },

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl SyncError {
    pub fn file_system(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::FileSystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn subprocess(program: &str, reason: impl Into<String>) -> Self {
        SyncError::Subprocess {
            program: program.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable name of the failure class, used in event codes.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => "transport",
            SyncError::Status { .. } => "status",
            SyncError::Format { .. } => "format",
            SyncError::FileSystem { .. } => "filesystem",
            SyncError::Subprocess { .. } => "subprocess",
            SyncError::Storage(_) => "storage",
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
