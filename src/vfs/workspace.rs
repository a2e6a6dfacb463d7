//! The host's workspace root, queried by the resolver and the index renderer.

use std::path::{Component, Path, PathBuf};

/// Read-only view of the editor workspace the virtual filesystem is mounted in.
pub trait Workspace: Send + Sync {
    /// Absolute path of the active workspace root directory, if any.
    fn root(&self) -> Option<PathBuf>;

    /// `path` relative to the workspace, prefixed with the root directory's own
    /// name, using `/` separators. Paths outside the root are returned as-is.
    fn as_relative_path(&self, path: &Path) -> String;
}

/// A workspace rooted at a fixed directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for LocalWorkspace {
    fn root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn as_relative_path(&self, path: &Path) -> String {
        let Ok(rest) = path.strip_prefix(&self.root) else {
            return path.to_string_lossy().into_owned();
        };
        let mut parts: Vec<String> = Vec::new();
        if let Some(name) = self.root.file_name() {
            parts.push(name.to_string_lossy().into_owned());
        }
        parts.extend(rest.components().filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        }));
        parts.join("/")
    }
}

/// A host without an open workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWorkspace;

impl Workspace for NoWorkspace {
    fn root(&self) -> Option<PathBuf> {
        None
    }

    fn as_relative_path(&self, path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_includes_root_name() {
        let ws = LocalWorkspace::new("/home/u/mail");
        assert_eq!(
            ws.as_relative_path(Path::new("/home/u/mail/inbox.eml")),
            "mail/inbox.eml"
        );
    }

    #[test]
    fn test_relative_path_outside_root() {
        let ws = LocalWorkspace::new("/home/u/mail");
        assert_eq!(ws.as_relative_path(Path::new("/tmp/x.eml")), "/tmp/x.eml");
    }

    #[test]
    fn test_no_workspace() {
        assert!(NoWorkspace.root().is_none());
    }
}
