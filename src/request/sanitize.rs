//! Inbound text clean-up applied before a parameter is stored.

use std::borrow::Cow;

/// Characters stripped from both ends of every value.
const TRIMMED: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Escape the five HTML-significant characters, single quote included.
#[must_use]
pub fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape, then trim. This is the only form in which values are kept.
#[must_use]
pub fn sanitize_value(raw: &str) -> String {
    escape_html(raw).trim_matches(TRIMMED).to_owned()
}

/// Normalize a parameter name: leading spaces dropped, spaces and dots become `_`.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim_start_matches(' ')
        .chars()
        .map(|c| if c == ' ' || c == '.' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_escaped() {
        assert_eq!(
            sanitize_value("<b>a&b</b>"),
            "&lt;b&gt;a&amp;b&lt;/b&gt;"
        );
        assert_eq!(
            sanitize_value(r#"say "hi" it's"#),
            "say &quot;hi&quot; it&#039;s"
        );
    }

    #[test]
    fn clean_text_is_borrowed() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn only_the_listed_whitespace_is_trimmed() {
        assert_eq!(sanitize_value(" \t\n\r\0\x0Bvalue \n"), "value");
        // non-breaking space survives
        assert_eq!(sanitize_value("\u{a0}x"), "\u{a0}x");
    }

    #[test]
    fn existing_entities_are_escaped_again() {
        assert_eq!(sanitize_value("&amp;"), "&amp;amp;");
    }

    #[test]
    fn names_follow_form_decoding_rules() {
        assert_eq!(normalize_name("  first name"), "first_name");
        assert_eq!(normalize_name("a.b"), "a_b");
        assert_eq!(normalize_name("plain"), "plain");
    }
}
