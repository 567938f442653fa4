//! HTML escaping for interpolated values.

use std::borrow::Cow;

fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        '/' => Some("&#x2F;"),
        '`' => Some("&#x60;"),
        '=' => Some("&#x3D;"),
        _ => None,
    }
}

/// Replace HTML-special characters with entity references.
///
/// Escapes `& < > " ' / \` =`. Borrows the input when nothing needs
/// escaping.
pub fn escape(input: &str) -> Cow<'_, str> {
    let Some(first) = input.find(|c| entity(c).is_some()) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len() + 8);
    out.push_str(&input[..first]);
    for c in input[first..].chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape("hello world"), Cow::Borrowed(_)));
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(
            escape(r#"&<>"'/`="#),
            "&amp;&lt;&gt;&quot;&#39;&#x2F;&#x60;&#x3D;"
        );
    }

    #[test]
    fn mixed_content() {
        assert_eq!(escape("a < b & c"), "a &lt; b &amp; c");
    }
}
