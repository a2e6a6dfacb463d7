//! Attachments exposed as files inside an email's virtual directory.

use bytes::Bytes;

/// One attachment of a parsed email.
///
/// The name is the sole addressing key inside the virtual directory, so it is
/// guaranteed non-empty and unique within its email by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// File name from `Content-Disposition`/`Content-Type` parameters.
    pub name: String,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub content_type: String,

    /// Decoded size in bytes.
    pub size: u64,

    /// Decoded content (transfer encoding already removed).
    pub content: Bytes,
}
