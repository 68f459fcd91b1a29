use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read keypoint file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to read keypoint data: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed keypoint data at line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("header declares {declared} keypoints but {actual} were read")]
    CountMismatch { declared: usize, actual: usize },
}

impl LoadError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        LoadError::Format { line, reason: reason.into() }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
