//! Small HTML helpers: escaping and plain-text-to-HTML conversion.

/// Escape the five characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Convert a plain-text body to HTML.
///
/// - Escapes markup characters
/// - Turns line breaks into `<br/>`
/// - Preserves runs of spaces with `&nbsp;`
pub fn text_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + 16);
    html.push_str("<p>");
    let normalized = text.replace("\r\n", "\n");
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            html.push_str("<br/>");
        }
        let escaped = escape_html(line);
        let mut prev_space = false;
        for ch in escaped.chars() {
            if ch == ' ' && prev_space {
                html.push_str("&nbsp;");
            } else {
                html.push(ch);
            }
            prev_space = ch == ' ';
        }
    }
    html.push_str("</p>");
    html
}
