//! Virtual filesystem over email containers.
//!
//! A virtual URI such as `eml:/mail/inbox.eml/report.pdf` is resolved to a
//! container file in the workspace root (`<root>/inbox.eml`) and a path inside
//! it (`report.pdf`). Each container appears as a directory holding a rendered
//! index document followed by its attachments.

pub mod path;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod stat;
pub mod workspace;

pub use path::{index_name, is_addressable_name, ContainerKind, ContainerPath, VirtualUri, CONTAINER_ROOT};
pub use provider::{ChangeEvents, EmailFileSystem, FileSystemProvider, Schemes, WriteOptions};
pub use resolver::{PathResolver, Resolution};
pub use stat::{DirEntry, FileChangeEvent, FileChangeType, FileStat, FileType};
pub use workspace::{LocalWorkspace, NoWorkspace, Workspace};
