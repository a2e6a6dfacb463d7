//! The virtual filesystem adapter: stat, list, and read over email containers.
//!
//! "Nothing there" is never an error here. Unresolvable paths, unparseable
//! containers, and unknown names answer with an unknown stat, an empty listing,
//! or empty bytes. Only integrity faults in a parsed container (unnamed,
//! duplicate, or unaddressable attachments, or one named like the index
//! document) fail `list` and `read`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::{Config, FilesystemConfig};
use crate::error::{Result, VfsError};
use crate::model::mail::ParsedEmail;
use crate::store::cache::{EmailCache, Invalidation, InvalidationKind, Lookup};

use super::path::{is_addressable_name, ContainerKind, ContainerPath, VirtualUri};
use super::render::render_index;
use super::resolver::{PathResolver, Resolution};
use super::stat::{DirEntry, FileChangeEvent, FileChangeType, FileStat, FileType};
use super::workspace::Workspace;

/// Filesystem operations the host editor issues against a registered scheme.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Metadata for `uri`. Always answers; unknown paths get [`FileStat::unknown`].
    async fn stat(&self, uri: &VirtualUri) -> FileStat;

    /// Entries of the directory at `uri`.
    async fn read_directory(&self, uri: &VirtualUri) -> Result<Vec<DirEntry>>;

    /// Contents of the file at `uri`.
    async fn read_file(&self, uri: &VirtualUri) -> Result<Bytes>;

    async fn create_directory(&self, uri: &VirtualUri) -> Result<()>;

    async fn write_file(&self, uri: &VirtualUri, content: &[u8], options: WriteOptions) -> Result<()>;

    async fn delete(&self, uri: &VirtualUri, recursive: bool) -> Result<()>;

    async fn rename(&self, from: &VirtualUri, to: &VirtualUri, overwrite: bool) -> Result<()>;
}

/// Flags passed with [`FileSystemProvider::write_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub create: bool,
    pub overwrite: bool,
}

/// URI schemes registered per container kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schemes {
    pub eml: String,
    pub msg: String,
}

impl Schemes {
    pub fn from_config(config: &FilesystemConfig) -> Self {
        Self {
            eml: config.eml_scheme.clone(),
            msg: config.msg_scheme.clone(),
        }
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        scheme == self.eml || scheme == self.msg
    }

    pub fn scheme_for(&self, kind: ContainerKind) -> &str {
        match kind {
            ContainerKind::Eml => &self.eml,
            ContainerKind::Msg => &self.msg,
        }
    }
}

impl Default for Schemes {
    fn default() -> Self {
        Self::from_config(&FilesystemConfig::default())
    }
}

/// Read-only filesystem exposing each email container as a directory.
pub struct EmailFileSystem {
    resolver: PathResolver,
    cache: EmailCache,
    schemes: Schemes,
}

impl EmailFileSystem {
    pub fn new(workspace: Arc<dyn Workspace>, config: &Config) -> Self {
        Self::with_cache(
            workspace,
            EmailCache::from_config(config),
            Schemes::from_config(&config.filesystem),
        )
    }

    pub fn with_cache(workspace: Arc<dyn Workspace>, cache: EmailCache, schemes: Schemes) -> Self {
        Self {
            resolver: PathResolver::new(workspace),
            cache,
            schemes,
        }
    }

    pub fn cache(&self) -> &EmailCache {
        &self.cache
    }

    pub fn schemes(&self) -> &Schemes {
        &self.schemes
    }

    /// Virtual URI of a container's directory, e.g. `eml:/mail/inbox.eml`.
    pub fn container_uri(&self, absolute_path: &Path, kind: ContainerKind) -> VirtualUri {
        container_uri(self.resolver.workspace().as_ref(), &self.schemes, absolute_path, kind)
    }

    /// Stream of change notifications for containers whose cached tree went stale.
    pub fn subscribe(&self) -> ChangeEvents {
        ChangeEvents {
            receiver: self.cache.subscribe(),
            workspace: Arc::clone(self.resolver.workspace()),
            schemes: self.schemes.clone(),
        }
    }

    /// Resolve `uri` and load its container.
    ///
    /// `Ok(None)` covers every "nothing there" case; only integrity faults are errors.
    async fn open(&self, uri: &VirtualUri) -> Result<Option<(ContainerPath, Arc<ParsedEmail>)>> {
        if !self.schemes.is_registered(uri.scheme()) {
            debug!(uri = %uri, "Scheme is not registered");
            return Ok(None);
        }

        let container = match self.resolver.resolve(uri).await {
            Resolution::Found(container) => container,
            Resolution::NotFound => return Ok(None),
        };

        match self.cache.get(&container.absolute_path).await {
            Ok(Lookup::Parsed(email)) => Ok(Some((container, email))),
            Ok(Lookup::Unsupported(kind)) => {
                debug!(uri = %uri, %kind, "Container kind is not supported");
                Ok(None)
            }
            Err(e) if e.is_integrity_violation() => Err(e),
            Err(e) => {
                warn!(uri = %uri, error = %e, "Email could not be loaded");
                Ok(None)
            }
        }
    }
}

/// Reject containers whose entries cannot all be addressed by name.
fn check_entries(container: &ContainerPath, email: &ParsedEmail, index: &str) -> Result<()> {
    let mut names = HashSet::from([index]);
    for (position, attachment) in email.attachments.iter().enumerate() {
        if attachment.name.is_empty() {
            return Err(VfsError::UnnamedAttachment {
                path: container.absolute_path.clone(),
                position,
            });
        }
        if !is_addressable_name(&attachment.name) {
            return Err(VfsError::UnaddressableAttachment {
                path: container.absolute_path.clone(),
                name: attachment.name.clone(),
            });
        }
        if attachment.name == index {
            return Err(VfsError::IndexCollision {
                path: container.absolute_path.clone(),
                name: attachment.name.clone(),
            });
        }
        if !names.insert(attachment.name.as_str()) {
            return Err(VfsError::DuplicateAttachment {
                path: container.absolute_path.clone(),
                name: attachment.name.clone(),
            });
        }
    }
    Ok(())
}

fn container_uri(
    workspace: &dyn Workspace,
    schemes: &Schemes,
    absolute_path: &Path,
    kind: ContainerKind,
) -> VirtualUri {
    VirtualUri::new(
        schemes.scheme_for(kind),
        &workspace.as_relative_path(absolute_path),
    )
}

#[async_trait]
impl FileSystemProvider for EmailFileSystem {
    async fn stat(&self, uri: &VirtualUri) -> FileStat {
        let (container, email) = match self.open(uri).await {
            Ok(Some(found)) => found,
            Ok(None) => return FileStat::unknown(),
            Err(e) => {
                warn!(uri = %uri, error = %e, "Email has unaddressable entries");
                return FileStat::unknown();
            }
        };

        let file_type = if container.is_root() {
            FileType::Directory
        } else if container.relative_path == container.index_name() {
            FileType::File
        } else if let Some(attachment) = email.attachment(&container.relative_path) {
            return FileStat {
                file_type: FileType::File,
                ctime: email.created_at,
                mtime: email.modified_at,
                size: attachment.size,
            };
        } else {
            return FileStat::unknown();
        };

        FileStat {
            file_type,
            ctime: email.created_at,
            mtime: email.modified_at,
            size: email.size,
        }
    }

    async fn read_directory(&self, uri: &VirtualUri) -> Result<Vec<DirEntry>> {
        let Some((container, email)) = self.open(uri).await? else {
            return Ok(Vec::new());
        };

        if !container.is_root() {
            debug!(uri = %uri, "Only the container root can be listed");
            return Ok(Vec::new());
        }

        let index = container.index_name();
        check_entries(&container, &email, &index)?;

        let mut entries = Vec::with_capacity(email.attachments.len() + 1);
        entries.push(DirEntry::file(index));
        entries.extend(email.attachments.iter().map(|a| DirEntry::file(a.name.as_str())));
        Ok(entries)
    }

    async fn read_file(&self, uri: &VirtualUri) -> Result<Bytes> {
        let Some((container, email)) = self.open(uri).await? else {
            return Ok(Bytes::new());
        };

        let index = container.index_name();
        check_entries(&container, &email, &index)?;

        if container.relative_path == index {
            let base = self.container_uri(&container.absolute_path, container.kind);
            return Ok(Bytes::from(render_index(&email, &base)));
        }

        match email.attachment(&container.relative_path) {
            Some(attachment) => Ok(attachment.content.clone()),
            None => Ok(Bytes::new()),
        }
    }

    async fn create_directory(&self, _uri: &VirtualUri) -> Result<()> {
        Err(VfsError::ReadOnly("create_directory"))
    }

    async fn write_file(&self, _uri: &VirtualUri, _content: &[u8], _options: WriteOptions) -> Result<()> {
        Err(VfsError::ReadOnly("write_file"))
    }

    async fn delete(&self, _uri: &VirtualUri, _recursive: bool) -> Result<()> {
        Err(VfsError::ReadOnly("delete"))
    }

    async fn rename(&self, _from: &VirtualUri, _to: &VirtualUri, _overwrite: bool) -> Result<()> {
        Err(VfsError::ReadOnly("rename"))
    }
}

/// Receiver of [`FileChangeEvent`]s, obtained from [`EmailFileSystem::subscribe`].
pub struct ChangeEvents {
    receiver: broadcast::Receiver<Invalidation>,
    workspace: Arc<dyn Workspace>,
    schemes: Schemes,
}

impl ChangeEvents {
    /// Wait for the next change. Returns `None` once the filesystem is dropped.
    pub async fn recv(&mut self) -> Option<FileChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(invalidation) => {
                    let Some(kind) = ContainerKind::from_path(&invalidation.path) else {
                        continue;
                    };
                    return Some(FileChangeEvent {
                        uri: container_uri(
                            self.workspace.as_ref(),
                            &self.schemes,
                            &invalidation.path,
                            kind,
                        ),
                        kind: match invalidation.kind {
                            InvalidationKind::Changed => FileChangeType::Changed,
                            InvalidationKind::Deleted => FileChangeType::Deleted,
                        },
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
