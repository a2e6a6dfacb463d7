//! Metadata and directory entries reported to the host, plus change events.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::path::VirtualUri;

/// Kind of a virtual entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Nothing known lives at this path.
    Unknown,
    File,
    Directory,
}

/// Metadata of a virtual entry, as the host filesystem abstraction expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStat {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    pub size: u64,
}

impl FileStat {
    /// The "does not exist" answer: current time, zero size.
    pub fn unknown() -> Self {
        let now = Utc::now();
        Self {
            file_type: FileType::Unknown,
            ctime: now,
            mtime: now,
            size: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.file_type == FileType::Unknown
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_type: FileType::File,
        }
    }
}

/// What happened to a virtual entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeType {
    Changed,
    Deleted,
}

/// Notification that the tree under `uri` is no longer what was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    pub uri: VirtualUri,
    pub kind: FileChangeType,
}
