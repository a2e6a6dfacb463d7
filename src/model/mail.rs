//! Parsed email representation served by the virtual filesystem.

use chrono::{DateTime, Utc};

use super::address::{render_list, EmailAddress};
use super::attachment::Attachment;

/// Everything the virtual directory of one container file is built from.
///
/// Derived once from the raw bytes and never mutated afterwards; the cache
/// hands out shared `Arc<ParsedEmail>` references.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEmail {
    /// Senders (`From:`).
    pub from: Vec<EmailAddress>,

    /// Primary recipients (`To:`).
    pub to: Vec<EmailAddress>,

    /// Decoded subject line (RFC 2047 encoded-words resolved).
    pub subject: String,

    /// HTML body. Plain-text-only messages are converted to HTML.
    pub body_html: String,

    /// Attachments in their original MIME order.
    pub attachments: Vec<Attachment>,

    /// Creation time of the backing file when it was parsed.
    pub created_at: DateTime<Utc>,

    /// Modification time of the backing file when it was parsed.
    pub modified_at: DateTime<Utc>,

    /// Size in bytes of the backing file when it was parsed.
    pub size: u64,
}

impl ParsedEmail {
    /// The `From:` header rendered as a single line.
    pub fn from_line(&self) -> String {
        render_list(&self.from)
    }

    /// The `To:` header rendered as a single line.
    pub fn to_line(&self) -> String {
        render_list(&self.to)
    }

    /// Look up an attachment by its exact file name.
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }
}

/// Filesystem metadata of a container file, captured once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Creation time (falls back to the modification time where unsupported).
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
}

impl FileMeta {
    /// Capture the fields we mirror from `std::fs::Metadata`.
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let modified_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
        let created_at = meta
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified_at);
        Self {
            created_at,
            modified_at,
            size: meta.len(),
        }
    }
}
