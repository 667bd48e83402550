//! Parsing of analyzer method signatures.
//!
//! A signature looks like `com.a.B: java.lang.String foo(int,long)`, usually
//! wrapped in angle brackets by the analyzer. Lines that do not fit the
//! grammar yield `None`; nothing here returns an error.

use std::sync::LazyLock;

use regex::Regex;

/// `<qualifier>: <return-type> <name>(` anchored at the start of the line.
/// The return type may contain generics or dots; the method name must be a
/// single word token directly before the first `(` that follows a space.
static SIGNATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):.*? (\w+)\(").unwrap());

/// Class and method names extracted from one signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedSignature {
    pub class_name: String,
    pub method_name: String,
}

/// Parse one signature, tolerating a leading `<` and surrounding whitespace.
pub fn parse_signature(raw: &str) -> Option<ParsedSignature> {
    let signature = raw.trim().trim_start_matches('<');
    let caps = SIGNATURE_RE.captures(signature)?;
    let class_name = caps.get(1)?.as_str().trim();
    let method_name = caps.get(2)?.as_str().trim();
    if class_name.is_empty() || method_name.is_empty() {
        return None;
    }
    Some(ParsedSignature {
        class_name: class_name.to_string(),
        method_name: method_name.to_string(),
    })
}

/// Strip exactly one pair of enclosing angle brackets, if present.
pub fn strip_brackets(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('<').unwrap_or(trimmed);
    trimmed.strip_suffix('>').unwrap_or(trimmed)
}

/// Split raw file bytes into lines, dropping any line that is not valid
/// UTF-8. Returns the decoded lines and the number dropped.
///
/// Line endings follow [`str::lines`]: `\n` or `\r\n`, no empty trailing line.
pub fn utf8_lines(bytes: &[u8]) -> (Vec<&str>, usize) {
    let mut lines = Vec::new();
    let mut invalid = 0usize;
    if bytes.is_empty() {
        return (lines, invalid);
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    for raw in body.split(|&b| b == b'\n') {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => lines.push(line),
            Err(_) => invalid += 1,
        }
    }
    (lines, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(class_name: &str, method_name: &str) -> Option<ParsedSignature> {
        Some(ParsedSignature {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
        })
    }

    #[test]
    fn test_parse_plain_signature() {
        assert_eq!(
            parse_signature(
                "com.site.blog.my.core.controller.admin.AdminController: java.lang.String passwordUpdate(javax.servlet.http.HttpServletRequest,java.lang.String)"
            ),
            parsed(
                "com.site.blog.my.core.controller.admin.AdminController",
                "passwordUpdate"
            )
        );
    }

    #[test]
    fn test_parse_strips_leading_bracket() {
        assert_eq!(
            parse_signature("<com.a.B: void foo()>\n"),
            parsed("com.a.B", "foo")
        );
    }

    #[test]
    fn test_parse_generic_return_type() {
        assert_eq!(
            parse_signature("com.a.Repo: java.util.List<com.a.Item> findAll(int)"),
            parsed("com.a.Repo", "findAll")
        );
    }

    #[test]
    fn test_parse_constructor_name() {
        assert_eq!(
            parse_signature("com.a.B: void <init>()"),
            None,
            "angle-bracketed names are not bare identifiers"
        );
    }

    #[test]
    fn test_parse_rejects_non_matching_lines() {
        assert_eq!(parse_signature(""), None);
        assert_eq!(parse_signature("no colon here foo()"), None);
        assert_eq!(parse_signature("com.a.B: void"), None);
        assert_eq!(parse_signature("com.a.B:foo()"), None);
        assert_eq!(parse_signature(": void foo()"), None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let line = "<com.a.C: int bar(int)>";
        assert_eq!(parse_signature(line), parse_signature(line));
    }

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets(" <com.a.B: void foo()> "), "com.a.B: void foo()");
        assert_eq!(strip_brackets("com.a.B: void foo()"), "com.a.B: void foo()");
    }

    #[test]
    fn test_utf8_lines_drops_invalid_lines_only() {
        let bytes = b"first\r\nbad \xE9 line\nlast\n";
        let (lines, invalid) = utf8_lines(bytes);
        assert_eq!(lines, vec!["first", "last"]);
        assert_eq!(invalid, 1);
    }

    #[test]
    fn test_utf8_lines_matches_str_lines() {
        for text in ["", "\n", "a", "a\n", "a\n\nb", "a\r\nb\r\n"] {
            let (lines, invalid) = utf8_lines(text.as_bytes());
            assert_eq!(lines, text.lines().collect::<Vec<_>>(), "{text:?}");
            assert_eq!(invalid, 0);
        }
    }
}
