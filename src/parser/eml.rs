//! Parser for individual `.eml` files (RFC 5322 messages without MBOX framing).

use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;
use mail_parser::{MessageParser, MimeHeaders};
use tracing::debug;

use crate::error::{Result, VfsError};
use crate::model::address::EmailAddress;
use crate::model::attachment::Attachment;
use crate::model::mail::{FileMeta, ParsedEmail};
use crate::parser::html::text_to_html;
use crate::vfs::path::is_addressable_name;

/// Read and parse an `.eml` file from disk.
///
/// The file is stat'ed before it is read, so the recorded metadata describes
/// the bytes that were parsed (modulo a concurrent writer).
pub async fn load_eml(path: &Path, max_size: u64) -> Result<ParsedEmail> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VfsError::FileNotFound(path.to_path_buf())
        } else {
            VfsError::io(path, e)
        }
    })?;

    if meta.len() > max_size {
        return Err(VfsError::ContainerTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit: max_size,
        });
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| VfsError::io(path, e))?;

    parse_eml(path, &data, FileMeta::from_metadata(&meta))
}

/// Parse the raw bytes of an `.eml` file.
///
/// `path` is only used for error reporting. Fails if the bytes are not a
/// message, or if any attachment is unnamed or shares its name with another.
pub fn parse_eml(path: &Path, data: &[u8], meta: FileMeta) -> Result<ParsedEmail> {
    let msg = MessageParser::default()
        .parse(skip_bom(data))
        .ok_or_else(|| VfsError::MalformedMessage(path.to_path_buf()))?;

    let body_html = msg
        .body_html(0)
        .map(|html| html.into_owned())
        .or_else(|| msg.body_text(0).map(|text| text_to_html(&text)))
        .unwrap_or_default();

    let attachments = collect_attachments(path, &msg)?;

    debug!(
        path = %path.display(),
        attachments = attachments.len(),
        "Parsed email"
    );

    Ok(ParsedEmail {
        from: EmailAddress::list_from(msg.from()),
        to: EmailAddress::list_from(msg.to()),
        subject: msg.subject().unwrap_or("").to_string(),
        body_html,
        attachments,
        created_at: meta.created_at,
        modified_at: meta.modified_at,
        size: meta.size,
    })
}

/// Extract attachments in MIME order, enforcing unique, non-empty names that
/// resolve back to themselves.
fn collect_attachments(path: &Path, msg: &mail_parser::Message<'_>) -> Result<Vec<Attachment>> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for (position, part) in msg.attachments().enumerate() {
        let name = match part.attachment_name().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(VfsError::UnnamedAttachment {
                    path: path.to_path_buf(),
                    position,
                })
            }
        };

        if !is_addressable_name(&name) {
            return Err(VfsError::UnaddressableAttachment {
                path: path.to_path_buf(),
                name,
            });
        }

        if !seen.insert(name.clone()) {
            return Err(VfsError::DuplicateAttachment {
                path: path.to_path_buf(),
                name,
            });
        }

        let content_type = part
            .content_type()
            .map(|ct: &mail_parser::ContentType<'_>| match ct.subtype() {
                Some(sub) => format!("{}/{sub}", ct.ctype()),
                None => ct.ctype().to_string(),
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let content = Bytes::copy_from_slice(part.contents());
        result.push(Attachment {
            name,
            content_type,
            size: content.len() as u64,
            content,
        });
    }

    Ok(result)
}

/// Skip a UTF-8 byte-order mark some Windows clients prepend to saved messages.
fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(size: u64) -> FileMeta {
        let now = Utc::now();
        FileMeta {
            created_at: now,
            modified_at: now,
            size,
        }
    }

    fn multipart(parts: &[(&str, &str)]) -> String {
        let mut raw = String::from(
            "From: Alice <a@x.com>\r\nTo: b@x.com\r\nSubject: Hi\r\nMIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"XX\"\r\n\r\n\
             --XX\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<p>hello</p>\r\n",
        );
        for (name, body) in parts {
            raw.push_str("--XX\r\nContent-Type: application/octet-stream");
            if !name.is_empty() {
                raw.push_str(&format!("\r\nContent-Disposition: attachment; filename=\"{name}\""));
            } else {
                raw.push_str("\r\nContent-Disposition: attachment");
            }
            raw.push_str(&format!("\r\n\r\n{body}\r\n"));
        }
        raw.push_str("--XX--\r\n");
        raw
    }

    #[test]
    fn test_parse_headers_body_and_attachments() {
        let raw = multipart(&[("a.txt", "first"), ("b.bin", "second")]);
        let email = parse_eml(Path::new("t.eml"), raw.as_bytes(), meta(raw.len() as u64)).unwrap();

        assert_eq!(email.from_line(), "Alice <a@x.com>");
        assert_eq!(email.to_line(), "b@x.com");
        assert_eq!(email.subject, "Hi");
        assert!(email.body_html.contains("<p>hello</p>"));
        let names: Vec<_> = email.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.bin"]);
        assert_eq!(&email.attachments[0].content[..], b"first");
        assert_eq!(email.attachments[1].size, 6);
        assert_eq!(email.size, raw.len() as u64);
    }

    #[test]
    fn test_plain_text_body_becomes_html() {
        let raw = "From: a@x.com\r\nSubject: Plain\r\n\r\nline one\r\nline <two>\r\n";
        let email = parse_eml(Path::new("p.eml"), raw.as_bytes(), meta(0)).unwrap();
        assert!(email.body_html.contains("line one"));
        assert!(email.body_html.contains("&lt;two&gt;"));
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn test_duplicate_attachment_names_rejected() {
        let raw = multipart(&[("same.txt", "1"), ("same.txt", "2")]);
        let err = parse_eml(Path::new("d.eml"), raw.as_bytes(), meta(0)).unwrap_err();
        assert!(matches!(err, VfsError::DuplicateAttachment { ref name, .. } if name == "same.txt"));
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_unnamed_attachment_rejected() {
        let raw = multipart(&[("ok.txt", "1"), ("", "2")]);
        let err = parse_eml(Path::new("u.eml"), raw.as_bytes(), meta(0)).unwrap_err();
        assert!(matches!(err, VfsError::UnnamedAttachment { position: 1, .. }));
    }

    #[test]
    fn test_unaddressable_attachment_rejected() {
        for name in [".", ".."] {
            let raw = multipart(&[("ok.txt", "1"), (name, "2")]);
            let err = parse_eml(Path::new("n.eml"), raw.as_bytes(), meta(0)).unwrap_err();
            assert!(
                matches!(err, VfsError::UnaddressableAttachment { name: ref n, .. } if n == name),
                "{name}: {err}"
            );
            assert!(err.is_integrity_violation());
        }
    }

    #[test]
    fn test_lenient_parsing() {
        // Arbitrary bytes still parse as a (headerless) message.
        let garbage = b"\x00\x01\x02garbage\xff\xfe";
        let email = parse_eml(Path::new("g.eml"), garbage, meta(0)).unwrap();
        assert_eq!(email.subject, "");

        let err = parse_eml(Path::new("e.eml"), b"", meta(0)).unwrap_err();
        assert!(matches!(err, VfsError::MalformedMessage(_)));
    }

    #[test]
    fn test_skip_bom() {
        assert_eq!(skip_bom(b"\xEF\xBB\xBFFrom: a"), b"From: a");
        assert_eq!(skip_bom(b"From: a"), b"From: a");
    }
}
