//! The synthetic index document shown as an email's rendered body.

use crate::model::mail::ParsedEmail;
use crate::parser::html::escape_html;

use super::path::VirtualUri;

/// Render the index document of `email`.
///
/// `container` is the virtual URI of the container's directory; attachment
/// links are built by appending each attachment name to it. Layout:
/// `From`/`To`/`Subject` lines, a rule, the attachment links (`name (size)`
/// separated by `; `) and a second rule when there are attachments, then the
/// body HTML untouched.
pub fn render_index(email: &ParsedEmail, container: &VirtualUri) -> String {
    let mut html = String::with_capacity(email.body_html.len() + 512);
    html.push_str(&format!("From: {}<br/>", escape_html(&email.from_line())));
    html.push_str(&format!("To: {}<br/>", escape_html(&email.to_line())));
    html.push_str(&format!("Subject: {}", escape_html(&email.subject)));
    html.push_str("<hr />");

    if !email.attachments.is_empty() {
        for attachment in &email.attachments {
            let href = container.join(&attachment.name);
            html.push_str(&format!(
                "<a href=\"{}\">{} ({})</a>; ",
                escape_html(&href.to_string()),
                escape_html(&attachment.name),
                human_size(attachment.size)
            ));
        }
        html.push_str("<hr />");
    }

    html.push_str(&email.body_html);
    html
}

/// Human-readable byte count, e.g. `1 KiB`.
pub fn human_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::address::EmailAddress;
    use crate::model::attachment::Attachment;
    use bytes::Bytes;
    use chrono::Utc;

    fn email(attachments: Vec<Attachment>) -> ParsedEmail {
        let now = Utc::now();
        ParsedEmail {
            from: vec![EmailAddress {
                display_name: "A".into(),
                address: "a@x.com".into(),
            }],
            to: vec![EmailAddress {
                display_name: String::new(),
                address: "b@x.com".into(),
            }],
            subject: "Hi & bye".into(),
            body_html: "<p>hello</p>".into(),
            attachments,
            created_at: now,
            modified_at: now,
            size: 10,
        }
    }

    fn attachment(name: &str, size: usize) -> Attachment {
        Attachment {
            name: name.into(),
            content_type: "application/octet-stream".into(),
            size: size as u64,
            content: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_render_without_attachments() {
        let uri = VirtualUri::new("eml", "/mail/inbox.eml");
        let html = render_index(&email(Vec::new()), &uri);
        assert_eq!(
            html,
            "From: A &lt;a@x.com&gt;<br/>To: b@x.com<br/>Subject: Hi &amp; bye<hr /><p>hello</p>"
        );
    }

    #[test]
    fn test_render_with_attachment_links() {
        let uri = VirtualUri::new("eml", "/mail/inbox.eml");
        let html = render_index(
            &email(vec![attachment("report.pdf", 1024), attachment("a b.txt", 3)]),
            &uri,
        );
        assert!(html.contains(
            "<a href=\"eml:/mail/inbox.eml/report.pdf\">report.pdf (1 KiB)</a>; "
        ));
        assert!(html.contains("a b.txt (3 B)</a>; <hr /><p>hello</p>"));
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1024), "1 KiB");
    }
}
