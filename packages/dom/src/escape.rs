//! Escaping for the destinations generated markup and script end up in.
//!
//! Every byte is classified once in a shared table: each entry holds one bit
//! per [`EscapeMode`] telling whether that byte may need an escape sequence in
//! that destination. A string whose bytes are all clear for a mode is copied
//! verbatim, without per-character branching.

use std::borrow::Cow;
use std::fmt;

/// Destination grammar a string is written into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeMode {
    /// Inside a double-quoted HTML attribute value
    HtmlAttribute,
    /// Inside a single-quoted JavaScript string literal
    JsSingleQuoted,
    /// Inside a double-quoted JavaScript string literal
    JsDoubleQuoted,
    /// Element text content
    PlainText,
    /// Element text content with line breaks turned into `<br />`
    PlainTextNewLines,
}

impl EscapeMode {
    const fn bit(self) -> u8 {
        match self {
            EscapeMode::HtmlAttribute => 1 << 0,
            EscapeMode::JsSingleQuoted => 1 << 1,
            EscapeMode::JsDoubleQuoted => 1 << 2,
            EscapeMode::PlainText => 1 << 3,
            EscapeMode::PlainTextNewLines => 1 << 4,
        }
    }

    /// Script literal mode for the given delimiter
    pub fn js_literal(delimiter: char) -> Self {
        if delimiter == '"' {
            EscapeMode::JsDoubleQuoted
        } else {
            EscapeMode::JsSingleQuoted
        }
    }

    fn is_js(self) -> bool {
        matches!(self, EscapeMode::JsSingleQuoted | EscapeMode::JsDoubleQuoted)
    }
}

const HTML: u8 = EscapeMode::HtmlAttribute.bit();
const JS_SQ: u8 = EscapeMode::JsSingleQuoted.bit();
const JS_DQ: u8 = EscapeMode::JsDoubleQuoted.bit();
const TEXT: u8 = EscapeMode::PlainText.bit();
const TEXT_NL: u8 = EscapeMode::PlainTextNewLines.bit();
const JS: u8 = JS_SQ | JS_DQ;

/// First byte of U+2028 and U+2029, which terminate lines in older script
/// grammars.
const LINE_SEPARATOR_LEAD: u8 = 0xE2;

const fn build_class_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0usize;
    while b < 0x20 {
        table[b] = HTML | JS;
        b += 1;
    }
    table[0x7F] = HTML | JS;
    table[0] |= TEXT | TEXT_NL;
    table[b'\n' as usize] |= TEXT_NL;

    table[b'&' as usize] = HTML | TEXT | TEXT_NL;
    table[b'<' as usize] = HTML | JS | TEXT | TEXT_NL;
    table[b'>' as usize] = HTML | TEXT | TEXT_NL;
    table[b'"' as usize] = HTML | JS_DQ;
    table[b'\'' as usize] = HTML | JS_SQ;
    table[b'\\' as usize] = JS;
    table[LINE_SEPARATOR_LEAD as usize] = JS;
    table
}

static CLASS_TABLE: [u8; 256] = build_class_table();

/// Whether `s` contains anything that must be escaped for `mode`
pub fn needs_escape(s: &str, mode: EscapeMode) -> bool {
    let bit = mode.bit();
    s.bytes().any(|b| CLASS_TABLE[b as usize] & bit != 0)
}

/// Append `s` to `out`, escaped for `mode`
pub fn escape_into(out: &mut String, s: &str, mode: EscapeMode) {
    if needs_escape(s, mode) {
        escape_slow(out, s, mode);
    } else {
        out.push_str(s);
    }
}

/// Escape `s` for `mode`, borrowing when nothing needs escaping
pub fn escape(s: &str, mode: EscapeMode) -> Cow<'_, str> {
    if needs_escape(s, mode) {
        let mut out = String::with_capacity(s.len() + 16);
        escape_slow(&mut out, s, mode);
        Cow::Owned(out)
    } else {
        Cow::Borrowed(s)
    }
}

fn escape_slow(out: &mut String, s: &str, mode: EscapeMode) {
    let bit = mode.bit();
    let mut plain_from = 0;

    for (i, c) in s.char_indices() {
        let flagged = if c.is_ascii() {
            CLASS_TABLE[c as usize] & bit != 0
        } else {
            mode.is_js() && matches!(c, '\u{2028}' | '\u{2029}')
        };

        if flagged {
            out.push_str(&s[plain_from..i]);
            write_escape(out, c, mode);
            plain_from = i + c.len_utf8();
        }
    }

    out.push_str(&s[plain_from..]);
}

fn write_escape(out: &mut String, c: char, mode: EscapeMode) {
    use std::fmt::Write;

    match mode {
        EscapeMode::HtmlAttribute => match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\0' => out.push('\u{FFFD}'),
            _ => {
                let _ = write!(out, "&#{};", c as u32);
            }
        },
        EscapeMode::JsSingleQuoted | EscapeMode::JsDoubleQuoted => match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\x3c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
        },
        EscapeMode::PlainText | EscapeMode::PlainTextNewLines => match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br />"),
            _ => out.push('\u{FFFD}'),
        },
    }
}

/// Display adapter writing its text escaped for a mode
pub struct Escaped<'a> {
    text: &'a str,
    mode: EscapeMode,
}

/// Wrap `text` so that formatting it writes the escaped form
pub fn escaped(text: &str, mode: EscapeMode) -> Escaped<'_> {
    Escaped { text, mode }
}

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(self.text, self.mode))
    }
}

/// Append `s` as a complete script string literal using `delimiter`
pub fn js_string_literal(out: &mut String, s: &str, delimiter: char) {
    out.push(delimiter);
    escape_into(out, s, EscapeMode::js_literal(delimiter));
    out.push(delimiter);
}

/// Append `s` as a complete double-quoted HTML attribute value
pub fn html_attribute_value(out: &mut String, s: &str) {
    out.push('"');
    escape_into(out, s, EscapeMode::HtmlAttribute);
    out.push('"');
}

/// Decode raw bytes for rendering; invalid sequences and NUL become U+FFFD.
pub fn sanitize(bytes: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if text.contains('\0') {
        Cow::Owned(text.replace('\0', "\u{FFFD}"))
    } else {
        text
    }
}

const URL_UNSAFE: &str = " $&+,:;=?@'\"<>#%{}|\\^~[]`/";

/// Percent-encode `url`, leaving characters in `allowed` untouched
pub fn url_encode(url: &str, allowed: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut result = String::with_capacity(url.len());
    for b in url.bytes() {
        let unsafe_byte = b <= 31 || b >= 127 || URL_UNSAFE.as_bytes().contains(&b);
        if unsafe_byte && !allowed.as_bytes().contains(&b) {
            result.push('%');
            result.push(HEX[(b >> 4) as usize] as char);
            result.push(HEX[(b & 0xF) as usize] as char);
        } else {
            result.push(b as char);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decodes the subset of HTML character references the encoder produces.
    fn unescape_html_attribute(s: &str) -> String {
        let mut out = String::new();
        let mut rest = s;
        while let Some(pos) = rest.find('&') {
            out.push_str(&rest[..pos]);
            let end = rest[pos..].find(';').unwrap() + pos;
            let entity = &rest[pos + 1..end];
            match entity {
                "amp" => out.push('&'),
                "lt" => out.push('<'),
                "gt" => out.push('>'),
                _ => {
                    let code: u32 = entity.trim_start_matches('#').parse().unwrap();
                    out.push(char::from_u32(code).unwrap());
                }
            }
            rest = &rest[end + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Decodes the escape sequences the script encoder produces.
    fn unescape_js(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next().unwrap() {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).unwrap()).unwrap());
                }
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).unwrap()).unwrap());
                }
                other => out.push(other),
            }
        }
        out
    }

    const SAMPLES: &[&str] = &[
        "",
        "plain text",
        "<b>\"quoted\" & 'single'</b>",
        "line\nbreak\r\ttab",
        "back\\slash",
        "</script><script>alert(1)</script>",
        "bell\u{7}del\u{7f}",
        "unicode ünïcödé \u{2028} \u{2029} 🎉",
    ];

    #[test]
    fn test_verbatim_when_nothing_to_escape() {
        let s = "hello world 123";
        assert!(!needs_escape(s, EscapeMode::HtmlAttribute));
        assert!(matches!(escape(s, EscapeMode::JsSingleQuoted), Cow::Borrowed(_)));
    }

    #[test]
    fn test_html_attribute_escapes() {
        assert_eq!(
            escape("a\"b<c>&'", EscapeMode::HtmlAttribute),
            "a&#34;b&lt;c&gt;&amp;&#39;"
        );
        assert_eq!(escape("a\nb", EscapeMode::HtmlAttribute), "a&#10;b");
    }

    #[test]
    fn test_js_escapes() {
        assert_eq!(escape("it's", EscapeMode::JsSingleQuoted), "it\\'s");
        assert_eq!(escape("it's", EscapeMode::JsDoubleQuoted), "it's");
        assert_eq!(escape("say \"hi\"", EscapeMode::JsDoubleQuoted), "say \\\"hi\\\"");
        assert_eq!(escape("</script>", EscapeMode::JsSingleQuoted), "\\x3c/script>");
        assert_eq!(escape("a\u{1}b", EscapeMode::JsSingleQuoted), "a\\x01b");
    }

    #[test]
    fn test_non_ascii_passes_through() {
        assert_eq!(escape("é€", EscapeMode::JsSingleQuoted), "é€");
        assert_eq!(escape("a\u{2028}b", EscapeMode::JsSingleQuoted), "a\\u2028b");
        assert_eq!(escape("a\u{2028}b", EscapeMode::HtmlAttribute), "a\u{2028}b");
    }

    #[test]
    fn test_plain_text_new_lines() {
        assert_eq!(escape("a<b\nc", EscapeMode::PlainText), "a&lt;b\nc");
        assert_eq!(escape("a<b\nc", EscapeMode::PlainTextNewLines), "a&lt;b<br />c");
    }

    #[test]
    fn test_html_attribute_round_trip() {
        for sample in SAMPLES {
            let encoded = escape(sample, EscapeMode::HtmlAttribute);
            assert!(!encoded.contains('"'));
            assert_eq!(&unescape_html_attribute(&encoded), sample);
        }
    }

    #[test]
    fn test_js_round_trip() {
        for sample in SAMPLES {
            let single = escape(sample, EscapeMode::JsSingleQuoted);
            assert!(!single.replace("\\'", "").contains('\''));
            assert_eq!(&unescape_js(&single), sample);

            let double = escape(sample, EscapeMode::JsDoubleQuoted);
            assert!(!double.replace("\\\"", "").contains('"'));
            assert_eq!(&unescape_js(&double), sample);
        }
    }

    #[test]
    fn test_literals() {
        let mut out = String::new();
        js_string_literal(&mut out, "a'b", '\'');
        out.push(' ');
        html_attribute_value(&mut out, "x\"y");
        assert_eq!(out, "'a\\'b' \"x&#34;y\"");
        assert_eq!(escaped("<", EscapeMode::PlainText).to_string(), "&lt;");
    }

    #[test]
    fn test_sanitize_invalid_bytes() {
        assert_eq!(sanitize(b"ok\xffok"), "ok\u{FFFD}ok");
        assert_eq!(sanitize(b"a\0b"), "a\u{FFFD}b");
        assert_eq!(escape("a\0b", EscapeMode::HtmlAttribute), "a\u{FFFD}b");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("a b/c", ""), "a%20b%2fc");
        assert_eq!(url_encode("a b/c", "/"), "a%20b/c");
        assert_eq!(url_encode("é", ""), "%c3%a9");
    }
}
