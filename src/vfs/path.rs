use std::path::{Path, PathBuf};

use crate::error::{Result, VfsError};

/// Relative path naming the root of a container's virtual directory.
pub const CONTAINER_ROOT: &str = ".";

/// Container formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// RFC 5322 message (`.eml`), parsed in-process.
    Eml,
    /// Outlook message (`.msg`). Recognized, but no parser exists for it.
    Msg,
}

impl ContainerKind {
    /// Detect the container kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "eml" => Some(Self::Eml),
            "msg" => Some(Self::Msg),
            _ => None,
        }
    }

    /// The lowercase extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Eml => "eml",
            Self::Msg => "msg",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An editor-addressable path under a registered scheme, e.g. `eml:/mail/inbox.eml/report.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualUri {
    scheme: String,
    /// Always starts with `/`.
    path: String,
}

impl VirtualUri {
    /// Build from a scheme and a path; a missing leading slash is added.
    pub fn new(scheme: impl Into<String>, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            scheme: scheme.into(),
            path,
        }
    }

    /// Parse `scheme:/path` or `scheme:path`.
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, path) = uri
            .split_once(':')
            .ok_or_else(|| VfsError::InvalidUri(uri.to_string()))?;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(VfsError::InvalidUri(uri.to_string()));
        }
        Ok(Self::new(scheme, path))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-empty path segments. Both `/` and `\` separate segments.
    pub fn segments(&self) -> Vec<&str> {
        split_segments(&self.path)
    }

    /// Append a single segment.
    pub fn join(&self, segment: &str) -> Self {
        let base = self.path.trim_end_matches('/');
        Self {
            scheme: self.scheme.clone(),
            path: format!("{base}/{segment}"),
        }
    }
}

impl std::fmt::Display for VirtualUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

impl std::str::FromStr for VirtualUri {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split a path into segments, dropping the leading and any empty segments.
pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

/// Whether an entry called `name` can be reached by appending it to a
/// container URI: the resolver must hand back exactly `name`.
pub fn is_addressable_name(name: &str) -> bool {
    let segments = split_segments(name);
    if segments.contains(&"..") {
        return false;
    }
    let kept: Vec<&str> = segments.into_iter().filter(|s| *s != ".").collect();
    !kept.is_empty() && kept.join("/") == name
}

/// A virtual path located inside a real container file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPath {
    /// Existing regular file whose extension matches `kind`.
    pub absolute_path: PathBuf,
    /// Container format.
    pub kind: ContainerKind,
    /// [`CONTAINER_ROOT`], the index document name, or an attachment name.
    pub relative_path: String,
}

impl ContainerPath {
    /// `true` when the path names the container's virtual directory itself.
    pub fn is_root(&self) -> bool {
        self.relative_path == CONTAINER_ROOT
    }

    /// Name of the rendered index document inside this container.
    pub fn index_name(&self) -> String {
        index_name(&self.absolute_path)
    }
}

/// Name of the synthetic index document for a container file.
///
/// The file stem is joined to `html` without a separating dot:
/// `inbox.eml` → `inboxhtml`. Existing editor links depend on this exact name.
pub fn index_name(container: &Path) -> String {
    let stem = container
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("{stem}html")
}
