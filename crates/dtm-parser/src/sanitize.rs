//! Recovery of strict JSON from near-JSON token files.
//!
//! Handles `//` and `/* */` comments, trailing commas, zero-width and BOM
//! characters, and an optional base64 envelope. Quoted regions (single or
//! double quotes) are never modified.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dtm_core::{ControlChar, ParseDiagnostics, SanitizeError};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Characters removed by the final pass.
const INVISIBLE_CHARS: [char; 5] = ['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}'];

/// Lines shown on either side of the error line.
const CONTEXT_RADIUS: usize = 5;
/// Lines shown when the error line is unknown.
const PREVIEW_LINES: usize = 50;
const PREVIEW_CHARS: usize = 1600;
const MAX_CONTROL_CHARS: usize = 20;
const SNIPPET_CHARS: usize = 200;

/// Tracks whether a scan is inside a quoted string.
#[derive(Debug, Default)]
struct StringState {
    quote: Option<char>,
    escaped: bool,
}

impl StringState {
    /// Feed one character. Returns true if it belongs to a string literal, quotes included.
    fn advance(&mut self, ch: char) -> bool {
        match self.quote {
            Some(quote) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                true
            }
            None if ch == '"' || ch == '\'' => {
                self.quote = Some(ch);
                true
            }
            None => false,
        }
    }
}

/// Remove `//` line comments and `/* */` block comments outside strings.
pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if state.advance(ch) {
            out.push(ch);
            i += 1;
            continue;
        }

        match (ch, chars.get(i + 1)) {
            ('/', Some('/')) => {
                i += 2;
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

/// Remove commas followed (after whitespace) by `}` or `]`, outside strings.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();

    for (i, &ch) in chars.iter().enumerate() {
        if !state.advance(ch) && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Remove zero-width and byte-order-mark characters outside strings.
pub fn strip_invisible(text: &str) -> String {
    let mut state = StringState::default();
    text.chars()
        .filter(|&c| state.advance(c) || !INVISIBLE_CHARS.contains(&c))
        .collect()
}

/// Run every sanitizing pass.
pub fn sanitize(text: &str) -> String {
    strip_invisible(&remove_trailing_commas(&strip_comments(text)))
}

/// Decode a base64 envelope to text.
///
/// Uses the standard decoder first and falls back to a table-driven decoder
/// that tolerates missing padding and malformed UTF-8.
pub fn decode_base64(body: &str) -> Result<String, SanitizeError> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => return Ok(text),
            Err(err) => debug!(error = %err, "decoded base64 is not valid UTF-8; using table decoder"),
        },
        Err(err) => debug!(error = %err, "standard base64 decoder rejected body; using table decoder"),
    }
    decode_base64_manual(&compact)
}

const BASE64_ALPHABET: &[u8; 65] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";
const PAD: u32 = 64;

/// Table-driven base64 decoder.
pub fn decode_base64_manual(input: &str) -> Result<String, SanitizeError> {
    let mut indices = Vec::with_capacity(input.len());
    for ch in input.chars().filter(|c| !c.is_whitespace()) {
        let index = BASE64_ALPHABET
            .iter()
            .position(|&b| b as char == ch)
            .ok_or_else(|| SanitizeError::Base64 {
                reason: format!("invalid character {ch:?}"),
            })?;
        indices.push(index as u32);
    }

    let mut bytes = Vec::with_capacity(indices.len() / 4 * 3);
    for quad in indices.chunks(4) {
        let at = |i: usize| quad.get(i).copied().unwrap_or(PAD);
        let (e1, e2, e3, e4) = (at(0), at(1), at(2), at(3));
        if e1 == PAD || e2 == PAD {
            break;
        }
        bytes.push(((e1 << 2) | (e2 >> 4)) as u8);
        if e3 != PAD {
            bytes.push((((e2 & 15) << 4) | (e3 >> 2)) as u8);
            if e4 != PAD {
                bytes.push((((e3 & 3) << 6) | e4) as u8);
            }
        }
    }

    Ok(decode_utf8_sequences(&bytes))
}

/// Reassemble UTF-8 byte sequences into text, replacing anything malformed.
fn decode_utf8_sequences(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i] as u32;
        let cont = |k: usize| bytes.get(i + k).map(|b| (b & 0x3F) as u32).unwrap_or(0);
        let (code, width) = match lead {
            0x00..=0x7F => (lead, 1),
            0xC0..=0xDF => (((lead & 0x1F) << 6) | cont(1), 2),
            0xE0..=0xEF => (((lead & 0x0F) << 12) | (cont(1) << 6) | cont(2), 3),
            0xF0..=0xF7 => (
                ((lead & 0x07) << 18) | (cont(1) << 12) | (cont(2) << 6) | cont(3),
                4,
            ),
            _ => (char::REPLACEMENT_CHARACTER as u32, 1),
        };
        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        i += width;
    }
    out
}

/// 32-bit rolling hash over UTF-16 code units, rendered as hex. For log correlation only.
pub fn content_hash(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, unit| (h << 5).wrapping_sub(h).wrapping_add(unit as i32));
    format!("{:x}", hash as u32)
}

/// Parse a token document body into JSON.
///
/// The body is base64-decoded first when `base64_encoded` is set, then
/// sanitized and parsed. If the sanitized text fails, the unsanitized text is
/// tried once; if that fails too the error carries [`ParseDiagnostics`].
pub fn parse_document(body: &str, base64_encoded: bool) -> Result<Value, SanitizeError> {
    debug!(len = body.len(), hash = %content_hash(body), "received body as text");

    let raw = if base64_encoded {
        match decode_base64(body) {
            Ok(text) => {
                debug!(len = text.len(), hash = %content_hash(&text), "decoded base64 body");
                text
            }
            Err(err) => {
                warn!(error = %err, "base64 decoding failed; parsing body as-is");
                body.to_string()
            }
        }
    } else {
        body.to_string()
    };

    let sanitized = sanitize(&raw);
    debug!(
        len = sanitized.len(),
        hash = %content_hash(&sanitized),
        start = %head(&sanitized, SNIPPET_CHARS),
        end = %tail(&sanitized, SNIPPET_CHARS),
        "parsing sanitized body"
    );

    match serde_json::from_str(&sanitized) {
        Ok(value) => Ok(value),
        Err(sanitized_err) => {
            warn!(error = %sanitized_err, "sanitized body failed to parse; trying raw text");
            serde_json::from_str(&raw).map_err(|raw_err| {
                error!(error = %raw_err, "raw body failed to parse as well");
                SanitizeError::Malformed(Box::new(diagnose(&sanitized, &sanitized_err)))
            })
        }
    }
}

/// Build operator diagnostics for a parse failure of `sanitized`.
pub fn diagnose(sanitized: &str, err: &serde_json::Error) -> ParseDiagnostics {
    let lines: Vec<&str> = sanitized.split('\n').collect();
    let error_line = Some(err.line()).filter(|&line| line > 0);
    let error_column = Some(err.column()).filter(|&column| column > 0);

    let control_chars = sanitized
        .chars()
        .enumerate()
        .filter(|(_, c)| (*c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r'))
        .take(MAX_CONTROL_CHARS)
        .map(|(i, c)| ControlChar {
            pos: i + 1,
            code: c as u32,
        })
        .collect();

    let (start, end) = match error_line {
        Some(line) => (
            line.saturating_sub(CONTEXT_RADIUS).max(1),
            (line + CONTEXT_RADIUS).min(lines.len()),
        ),
        None => (1, PREVIEW_LINES.min(lines.len())),
    };

    let error_line_codes = error_line.map(|line| {
        lines
            .get(line - 1)
            .map(|l| l.chars().map(|c| c as u32).collect())
            .unwrap_or_default()
    });

    ParseDiagnostics {
        message: err.to_string(),
        error_line,
        error_column,
        error_context: numbered(&lines, start, end),
        error_line_codes,
        control_chars,
        sanitized_preview: head(sanitized, PREVIEW_CHARS),
        preview_lines: numbered(&lines, 1, PREVIEW_LINES.min(lines.len())),
    }
}

/// Lines `start..=end` (1-based) prefixed with their numbers.
fn numbered(lines: &[&str], start: usize, end: usize) -> String {
    if start > end {
        return String::new();
    }
    lines[start - 1..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}: {}", start + i, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn head(text: &str, count: usize) -> String {
    text.chars().take(count).collect()
}

fn tail(text: &str, count: usize) -> String {
    let skip = text.chars().count().saturating_sub(count);
    text.chars().skip(skip).collect()
}
