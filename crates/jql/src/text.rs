//! Lexical support for the canonical query text.
//!
//! This module decides when a value can be written as a bare token, quotes and
//! escapes values that cannot, and decodes escaped text back into its raw form.
//!
//! # Escapes
//!
//! | Character | Escape |
//! |-----------|--------|
//! | tab | `\t` |
//! | newline | `\n` |
//! | carriage return | `\r` |
//! | `"` | `\"` |
//! | `'` | `\'` |
//! | `\` | `\\` |
//! | other control characters | `\uXXXX` |
//!
//! # Example
//!
//! ```
//! use helios_jql::text::{decode, encode_string_value};
//!
//! assert_eq!(encode_string_value("laptop"), "laptop");
//! assert_eq!(encode_string_value("dell laptop"), "\"dell laptop\"");
//! assert_eq!(decode(&encode_string_value("a \"b\"")).unwrap(), "a \"b\"");
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::EscapeError;

/// Words that cannot appear as bare field names or values.
///
/// Matching is case-insensitive.
pub static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abort", "access", "add", "after", "alias", "all", "alter", "and", "any", "as", "asc",
        "audit", "avg", "before", "begin", "between", "boolean", "break", "by", "byte", "catch",
        "cf", "changed", "char", "character", "check", "checkpoint", "collate", "collation",
        "column", "commit", "connect", "continue", "count", "create", "current", "date",
        "decimal", "declare", "decrement", "default", "defaults", "define", "delete", "delimiter",
        "desc", "difference", "distinct", "divide", "do", "double", "drop", "else", "empty",
        "encoding", "end", "equals", "escape", "exclusive", "exec", "execute", "exists",
        "explain", "false", "fetch", "file", "field", "first", "float", "for", "from", "function",
        "go", "goto", "grant", "greater", "group", "having", "identified", "if", "immediate",
        "in", "increment", "index", "initial", "inner", "inout", "input", "insert", "int",
        "integer", "intersect", "intersection", "into", "is", "isempty", "isnull", "join",
        "last", "left", "less", "like", "limit", "lock", "long", "max", "min", "minus", "mode",
        "modify", "modulo", "more", "multiply", "next", "noaudit", "not", "notin", "nowait",
        "null", "number", "object", "of", "on", "option", "or", "order", "outer", "output",
        "power", "previous", "prior", "privileges", "public", "raise", "raw", "remainder",
        "rename", "resource", "return", "returns", "revoke", "right", "row", "rowid", "rownum",
        "rows", "select", "session", "set", "share", "size", "sqrt", "start", "strict",
        "string", "subtract", "sum", "synonym", "table", "then", "to", "trans", "transaction",
        "trigger", "true", "uid", "union", "unique", "update", "user", "validate", "values",
        "view", "was", "when", "whenever", "where", "while", "with",
    ]
    .into_iter()
    .collect()
});

/// Characters with syntactic meaning that force a value to be quoted.
const RESERVED_CHARS: &[char] = &[
    '"', '\'', '=', '!', '<', '>', '(', ')', '~', ',', '[', ']', '|', '&', '{', '}', '*', '/',
    '%', '+', '^', '$', '#', '@', '?', ';', '\\',
];

/// Returns `true` if `word` is a reserved word, ignoring case.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(word.to_lowercase().as_str())
}

/// Returns `true` if `c` must always be escaped in query text.
///
/// The set covers C0 controls except newline and carriage return, DEL and the
/// C1 controls, and the Unicode non-characters `U+FDD0..=U+FDEF` and
/// `U+FFFE..=U+FFFF`.
pub fn is_jql_control(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{0009}'
            | '\u{000b}'..='\u{000c}'
            | '\u{000e}'..='\u{001f}'
            | '\u{007f}'..='\u{009f}'
            | '\u{fdd0}'..='\u{fdef}'
            | '\u{fffe}'..='\u{ffff}'
    )
}

/// Returns `true` if `value` can be written unquoted.
///
/// A bare token is non-empty, is not a reserved word, and contains no
/// whitespace, reserved punctuation or control characters.
pub fn is_valid_bare_token(value: &str) -> bool {
    if value.is_empty() || is_reserved_word(value) {
        return false;
    }
    value
        .chars()
        .all(|c| !c.is_whitespace() && !is_jql_control(c) && !RESERVED_CHARS.contains(&c))
}

/// Escapes a single character, returning `None` if it needs no escape.
pub fn escape_char(c: char) -> Option<String> {
    match c {
        '\t' => Some("\\t".to_string()),
        '\n' => Some("\\n".to_string()),
        '\r' => Some("\\r".to_string()),
        '"' => Some("\\\"".to_string()),
        '\'' => Some("\\'".to_string()),
        '\\' => Some("\\\\".to_string()),
        c if is_jql_control(c) => Some(format!("\\u{:04x}", c as u32)),
        _ => None,
    }
}

/// Escapes every character in `value` that cannot appear inside quotes.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match escape_char(c) {
            Some(escaped) => out.push_str(&escaped),
            None => out.push(c),
        }
    }
    out
}

/// Wraps `value` in double quotes after escaping it.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

/// Encodes a value for query text: bare if valid, quoted and escaped otherwise.
pub fn encode_string_value(value: &str) -> String {
    if is_valid_bare_token(value) {
        value.to_string()
    } else {
        quote(value)
    }
}

/// Encodes a clause or field name for query text.
///
/// Names follow the same rules as values.
pub fn encode_field_name(name: &str) -> String {
    encode_string_value(name)
}

/// Decodes escaped query text.
///
/// Surrounding double quotes, when present, are stripped before the body is
/// unescaped, so `decode(encode_string_value(s)) == s`.
///
/// # Errors
///
/// Fails on a trailing lone backslash, an unknown escape letter, or a `\u`
/// escape that is not followed by four hex digits.
pub fn decode(text: &str) -> Result<String, EscapeError> {
    let body = if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    };
    unescape(body)
}

/// Reverses [`escape`] on text without surrounding quotes.
pub fn unescape(text: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some((_, next)) = chars.next() else {
            return Err(EscapeError::UnterminatedEscape { position });
        };

        match next {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                let mut digits = String::with_capacity(4);
                while digits.len() < 4 {
                    match chars.peek() {
                        Some((_, d)) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let decoded = if digits.len() == 4 {
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        return Err(EscapeError::MalformedUnicodeEscape {
                            sequence: format!("\\u{}", digits),
                            position,
                        });
                    }
                }
            }
            other => {
                return Err(EscapeError::IllegalEscape {
                    sequence: format!("\\{}", other),
                    position,
                });
            }
        }
    }

    Ok(out)
}
