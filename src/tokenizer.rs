//! Text tokenization (C1).
//!
//! An ASCII fast path iterates code units directly; anything outside ASCII
//! falls back to a Unicode-property scan. The two paths intentionally accept
//! different token shapes (the ASCII path allows a token to start with a
//! digit; the Unicode path requires a leading Letter), matching the two
//! independent rules a faithful port must preserve.

use std::collections::HashSet;

/// Tokenize `text`, dropping any token shorter than two characters or present
/// in `stop_words`.
pub fn tokenize(text: &str, stop_words: Option<&HashSet<String>>) -> Vec<String> {
    if text.is_ascii() {
        tokenize_ascii(text, stop_words)
    } else {
        tokenize_unicode(text, stop_words)
    }
}

fn is_ascii_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn tokenize_ascii(text: &str, stop_words: Option<&HashSet<String>>) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if is_ascii_token_byte(b) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            emit(&text[s..i], stop_words, &mut tokens, str::to_ascii_lowercase);
        }
    }
    if let Some(s) = start {
        emit(&text[s..], stop_words, &mut tokens, str::to_ascii_lowercase);
    }
    tokens
}

fn tokenize_unicode(text: &str, stop_words: Option<&HashSet<String>>) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_alphabetic() {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            emit(&raw, stop_words, &mut tokens, |s| s.to_lowercase());
        } else {
            i += 1;
        }
    }
    tokens
}

fn emit(
    raw: &str,
    stop_words: Option<&HashSet<String>>,
    out: &mut Vec<String>,
    lower: impl Fn(&str) -> String,
) {
    if raw.chars().count() < 2 {
        return;
    }
    let lowered = lower(raw);
    if let Some(stops) = stop_words {
        if stops.contains(&lowered) {
            return;
        }
    }
    out.push(lowered);
}
