use std::path::PathBuf;

use thiserror::Error;

/// Result type used across the job pipeline.
pub type AdaptResult<T> = Result<T, AdaptError>;

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("{} NOT FOUND", path.display())]
    FileNotFound { path: PathBuf },

    #[error("unable to read {}: {message}", path.display())]
    ReadError { path: PathBuf, message: String },

    #[error("wrong format in {}: {detail}", path.display())]
    MalformedParameterRecord { path: PathBuf, detail: String },

    #[error("UNABLE TO OPEN {}", path.display())]
    CannotOpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no referenced triangles to describe in {}", path.display())]
    NothingToWrite { path: PathBuf },

    #[error("configuration conflict: {0}")]
    ConfigurationConflict(String),

    #[error("scaling failure: {0}")]
    ScalingFailure(String),

    #[error("size computation failure: {0}")]
    SizingFailure(String),

    #[error("unable to write {}: {message}", path.display())]
    WriteError { path: PathBuf, message: String },
}

impl AdaptError {
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::MalformedParameterRecord {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WriteError {
            path: path.into(),
            message: message.into(),
        }
    }
}
