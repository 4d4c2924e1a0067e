//! Pull the `code` field out of a structured answer that is still streaming.
//!
//! The accumulated text is usually an unterminated JSON object. We locate the
//! `"code": "` key, take everything up to the closing quote (or the end of
//! input), drop a trailing escape sequence that has not fully arrived, and
//! unescape what is left. Successive results over a growing stream are
//! prefixes of each other, so the preview never flickers backwards.

use regex::Regex;
use std::sync::LazyLock;

static CODE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""code"\s*:\s*""#).expect("valid regex"));

/// Best-effort decoded `code` value from partial JSON, or `None` when the
/// field has not started (or is still empty).
pub fn extract_partial_code(content: &str) -> Option<String> {
    let key = CODE_KEY.find(content)?;
    let rest = &content[key.end()..];
    let raw = complete_escapes(&rest[..value_end(rest)]);
    let code = unescape(raw);
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Byte index of the quote closing the value. A quote counts as closing when
/// it is followed by `,`, `}` or nothing at all; otherwise the whole
/// remainder is still value.
fn value_end(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let after = rest[i + 1..].trim_start();
                if after.is_empty() || after.starts_with(',') || after.starts_with('}') {
                    return i;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    rest.len()
}

/// Longest prefix that does not end inside an escape sequence
/// (a lone `\` or a `\u` with fewer than four hex digits).
fn complete_escapes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let width = match bytes.get(i + 1) {
            None => return &raw[..i],
            Some(b'u') => 6,
            Some(_) => 2,
        };
        if i + width > bytes.len() {
            return &raw[..i];
        }
        i += width;
    }
    raw
}

fn unescape(raw: &str) -> String {
    match serde_json::from_str::<String>(&format!("\"{}\"", raw)) {
        Ok(decoded) => decoded,
        Err(_) => unescape_lossy(raw),
    }
}

/// Single left-to-right pass for text a strict JSON decoder rejects
/// (raw control characters, lone surrogates). Unknown escapes are kept
/// verbatim.
fn unescape_lossy(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
