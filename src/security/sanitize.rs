//! Output escaping and input normalization.

use regex::Regex;
use std::sync::LazyLock;

static ENCODED_CRLF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)%0[ad]").expect("static regex"));

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make a value safe for an email header.
///
/// CR and LF (raw or percent-encoded) are what let an attacker append
/// `Bcc:` lines; they are replaced by spaces and the result is trimmed.
pub fn strip_header_injection(input: &str) -> String {
    let decoded_free = ENCODED_CRLF.replace_all(input, " ");
    let mut out = String::with_capacity(decoded_free.len());
    let mut last_space = false;
    for c in decoded_free.chars() {
        let c = if matches!(c, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}') || c.is_control() {
            ' '
        } else {
            c
        };
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Trim, normalize line endings and drop control characters other than
/// newline and tab.
pub fn clean_text(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert plain text to HTML, escaping first and keeping line breaks.
pub fn text_to_html(input: &str) -> String {
    escape_html(input).replace('\n', "<br>")
}
