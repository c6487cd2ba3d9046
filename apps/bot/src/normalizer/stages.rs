//! Individual text stages of the normalizer pipeline.
//!
//! Each stage is a pure `&str -> String` transform, tuned to one failure mode
//! observed in model output. Stages never fail; a stage that finds nothing to
//! do returns its input unchanged.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

const FENCE: &str = "```";

fn newline_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*").expect("newline regex must compile"))
}

fn trailing_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex must compile"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex must compile"))
}

/// When a code fence is present, keeps only the span from the first `{` to the
/// last `}`. Fence markers and surrounding prose are dropped with it.
pub fn extract_fenced_object(text: &str) -> String {
    if !text.contains(FENCE) {
        return text.to_string();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}

/// Turns literal `\n`, `\"` and `\\` sequences into the characters they name.
pub fn unescape_sequences(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

/// Joins the object onto one logical line: a newline and the indentation that
/// follows it become a single space.
pub fn collapse_newlines(text: &str) -> String {
    newline_run().replace_all(text, " ").into_owned()
}

/// Drops a comma that directly precedes a closing brace or bracket.
pub fn strip_trailing_commas(text: &str) -> String {
    trailing_comma().replace_all(text, "$1").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text, " ").into_owned()
}

pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

/// Quotes bare keys and bare scalar values inside objects.
///
/// A value is left alone when it starts with `"`, `{` or `[`, or when it is a
/// JSON number, `true`, `false` or `null`. A bare value ends at the first `,`,
/// `}` or `]`, so values with embedded commas are not recovered. Quoted strings
/// are copied through untouched.
pub fn quote_bare_scalars(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(text.len() + 16);
    let mut stack: Vec<char> = Vec::new();
    let mut expect_key = false;
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            '"' => {
                let end = string_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                expect_key = false;
                continue;
            }
            '{' => {
                stack.push('{');
                expect_key = true;
                out.push(c);
            }
            '[' => {
                stack.push('[');
                expect_key = false;
                out.push(c);
            }
            '}' | ']' => {
                stack.pop();
                expect_key = false;
                out.push(c);
            }
            ',' => {
                expect_key = stack.last() == Some(&'{');
                out.push(c);
            }
            ':' if stack.last() == Some(&'{') => {
                out.push(c);
                i += 1;
                while i < len && chars[i].is_whitespace() {
                    out.push(chars[i]);
                    i += 1;
                }
                if i < len && !matches!(chars[i], '"' | '{' | '[') {
                    let start = i;
                    while i < len && !matches!(chars[i], ',' | '}' | ']') {
                        i += 1;
                    }
                    let raw: String = chars[start..i].iter().collect();
                    push_scalar(&mut out, &raw);
                }
                expect_key = false;
                continue;
            }
            _ if expect_key && (c.is_alphabetic() || c == '_') => {
                let start = i;
                while i < len && !matches!(chars[i], ':' | ',' | '{' | '}' | '[' | ']' | '"') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                if i < len && chars[i] == ':' {
                    let key = raw.trim_end();
                    out.push_str(&quoted(key));
                    out.push_str(&raw[key.len()..]);
                } else {
                    out.push_str(&raw);
                }
                expect_key = false;
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index one past the closing quote of the string opening at `start`, or the
/// end of input for an unterminated string.
fn string_end(chars: &[char], start: usize) -> usize {
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '"' => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

fn push_scalar(out: &mut String, raw: &str) {
    let value = raw.trim_end();
    if value.is_empty() || is_json_scalar(value) {
        out.push_str(raw);
    } else {
        out.push_str(&quoted(value));
        out.push_str(&raw[value.len()..]);
    }
}

fn is_json_scalar(value: &str) -> bool {
    matches!(value, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(value).is_ok()
}

fn quoted(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
