//! Mapping virtual URIs onto container files in the workspace root.

use std::path::{Component, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::path::{ContainerKind, ContainerPath, VirtualUri, CONTAINER_ROOT};
use super::workspace::Workspace;

/// Outcome of mapping a virtual URI onto a container file.
///
/// Every failure collapses into `NotFound`: callers treat it as "this path
/// denotes nothing" whatever the cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ContainerPath),
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<ContainerPath> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound => None,
        }
    }
}

/// Resolves virtual URIs to container files by walking the real filesystem.
///
/// The first segment of a virtual path must be the workspace root directory's
/// own name. Only containers placed directly in the workspace root resolve;
/// containers in subdirectories are not supported.
pub struct PathResolver {
    workspace: Arc<dyn Workspace>,
}

impl PathResolver {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        PathResolver { workspace }
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    /// Locate the container file named by `uri` and the path inside it.
    pub async fn resolve(&self, uri: &VirtualUri) -> Resolution {
        let Some(root) = self.workspace.root() else {
            debug!(uri = %uri, "No workspace root");
            return Resolution::NotFound;
        };

        // Split the root into its filesystem anchor ("/" or "C:\") and names.
        let mut accumulated = PathBuf::new();
        let mut root_segments: Vec<String> = Vec::new();
        for component in root.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => accumulated.push(component.as_os_str()),
                Component::Normal(name) => root_segments.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    debug!(root = %root.display(), "Workspace root is not normalized");
                    return Resolution::NotFound;
                }
            }
        }

        let Some(root_name) = root_segments.pop() else {
            return Resolution::NotFound;
        };

        let mut virtual_segments = Vec::new();
        for segment in uri.segments() {
            match segment {
                "." => {}
                ".." => {
                    debug!(uri = %uri, "Parent segments are not resolvable");
                    return Resolution::NotFound;
                }
                other => virtual_segments.push(other),
            }
        }

        if virtual_segments.first() != Some(&root_name.as_str()) {
            debug!(uri = %uri, root = %root_name, "Path is not anchored at the workspace root");
            return Resolution::NotFound;
        }

        let candidates: Vec<&str> = root_segments
            .iter()
            .map(String::as_str)
            .chain(virtual_segments)
            .collect();
        // Index of the segment right below the workspace root.
        let container_depth = root_segments.len() + 1;

        for (depth, segment) in candidates.iter().enumerate() {
            accumulated.push(segment);

            let meta = match tokio::fs::metadata(&accumulated).await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %accumulated.display(), error = %e, "Path vanished or is inaccessible");
                    return Resolution::NotFound;
                }
            };

            if meta.is_file() {
                if depth != container_depth {
                    debug!(path = %accumulated.display(), "File outside the workspace root level");
                    return Resolution::NotFound;
                }
                let Some(kind) = ContainerKind::from_path(&accumulated) else {
                    debug!(path = %accumulated.display(), "Not an email container");
                    return Resolution::NotFound;
                };
                let rest = &candidates[depth + 1..];
                let relative_path = if rest.is_empty() {
                    CONTAINER_ROOT.to_string()
                } else {
                    rest.join("/")
                };
                return Resolution::Found(ContainerPath {
                    absolute_path: accumulated,
                    kind,
                    relative_path,
                });
            } else if meta.is_dir() {
                if depth >= container_depth {
                    debug!(path = %accumulated.display(), "Containers in subdirectories are not supported");
                    return Resolution::NotFound;
                }
            } else {
                debug!(path = %accumulated.display(), "Neither a file nor a directory");
                return Resolution::NotFound;
            }
        }

        Resolution::NotFound
    }
}
