//! Centralized error types for emlvfs.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// All errors produced by the emlvfs library.
#[derive(Error, Debug)]
pub enum VfsError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The container file does not exist.
    #[error("Email file not found: {0}")]
    FileNotFound(PathBuf),

    /// The bytes could not be parsed as an RFC 5322 message.
    #[error("File does not appear to be a valid email message: {0}")]
    MalformedMessage(PathBuf),

    /// The container exceeds the configured size limit.
    #[error("Email file '{path}' is {size} bytes, over the {limit} byte limit")]
    ContainerTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// An attachment has no file name, so it cannot be addressed.
    #[error("Attachment #{position} in '{path}' has no file name")]
    UnnamedAttachment { path: PathBuf, position: usize },

    /// Two attachments share a file name.
    #[error("Multiple attachments named '{name}' in '{path}'")]
    DuplicateAttachment { path: PathBuf, name: String },

    /// An attachment's name does not survive the trip through a virtual path.
    #[error("Attachment '{name}' in '{path}' cannot be addressed by a virtual path")]
    UnaddressableAttachment { path: PathBuf, name: String },

    /// An attachment is named like the rendered index document.
    #[error("Attachment '{name}' in '{path}' collides with the index document name")]
    IndexCollision { path: PathBuf, name: String },

    /// A mutating operation was attempted on the read-only filesystem.
    #[error("Read-only filesystem: {0} is not supported")]
    ReadOnly(&'static str),

    /// A virtual URI could not be parsed.
    #[error("Invalid virtual URI: {0}")]
    InvalidUri(String),

    /// The task parsing a container was dropped before it finished.
    #[error("Parse of '{0}' was cancelled")]
    Cancelled(PathBuf),

    /// A failure reported by another caller's parse of the same container.
    #[error(transparent)]
    Shared(#[from] SharedError),
}

/// Convenience alias for `Result<T, VfsError>`.
pub type Result<T> = std::result::Result<T, VfsError>;

impl VfsError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for faults in the source data that must not be papered over.
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            Self::UnnamedAttachment { .. }
            | Self::DuplicateAttachment { .. }
            | Self::UnaddressableAttachment { .. }
            | Self::IndexCollision { .. } => true,
            Self::Shared(shared) => shared.0.is_integrity_violation(),
            _ => false,
        }
    }
}

/// A parse failure fanned out to every caller waiting on the same container.
#[derive(Debug, Clone)]
pub struct SharedError(pub Arc<VfsError>);

impl std::fmt::Display for SharedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<VfsError> for SharedError {
    fn from(err: VfsError) -> Self {
        // Avoid nesting when a shared failure is shared again.
        match err {
            VfsError::Shared(shared) => shared,
            other => Self(Arc::new(other)),
        }
    }
}
