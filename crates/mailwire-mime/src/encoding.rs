//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::charset::Charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Maximum line length for Quoted-Printable encoding (RFC 2045 §6.7 rule 5).
const MAX_LINE_LENGTH: usize = 76;

/// Soft line-wrap width used for `format=flowed` bodies (RFC 3676), leaving
/// room for the trailing space that marks a flowed soft break.
const FLOWED_LINE_LENGTH: usize = 78;

/// Where an encoded line ended and why.
///
/// The index is the byte offset into the *source* data at which the break
/// occurred, so callers can recover which input line a given output line
/// came from without re-scanning the encoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    /// A wrap inserted purely to respect the line-length limit. Readers must
    /// join the following line onto this one to recover the logical line.
    Soft(usize),
    /// A real line break present in the source text.
    Hard(usize),
}

/// Encodes text using Quoted-Printable encoding (RFC 2045), wrapping at the
/// standard 76-column limit with no `format=flowed` soft breaks.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    encode_quoted_printable_ex(text.as_bytes(), false).0
}

/// Encodes bytes using Quoted-Printable encoding, returning the line breaks
/// alongside the text so a caller building a `format=flowed` body can tell
/// which breaks are real paragraph breaks versus wrap points.
///
/// When `flowed` is true, lines wrap at [`FLOWED_LINE_LENGTH`] instead of
/// [`MAX_LINE_LENGTH`], leaving headroom for the space RFC 3676 requires
/// before a soft break.
#[must_use]
pub fn encode_quoted_printable_ex(data: &[u8], flowed: bool) -> (String, Vec<LineBreak>) {
    let limit = if flowed {
        FLOWED_LINE_LENGTH
    } else {
        MAX_LINE_LENGTH
    } - 1;

    let mut result = String::new();
    let mut breaks = Vec::new();
    let mut line_length = 0usize;
    let mut i = 0usize;

    while i < data.len() {
        let byte = data[i];

        if byte == b'\n' {
            result.push_str("\r\n");
            breaks.push(LineBreak::Hard(i));
            line_length = 0;
            i += 1;
            continue;
        }
        if byte == b'\r' && data.get(i + 1) == Some(&b'\n') {
            result.push_str("\r\n");
            breaks.push(LineBreak::Hard(i));
            line_length = 0;
            i += 2;
            continue;
        }

        if line_length >= limit {
            result.push_str("=\r\n");
            breaks.push(LineBreak::Soft(i));
            line_length = 0;
        }

        match byte {
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(byte as char);
                line_length += 1;
            }
            b' ' | b'\t' => {
                // Trailing whitespace before a line break must be encoded,
                // or compliant MTAs/MUAs may strip it in transit.
                let followed_by_eol = match data.get(i + 1) {
                    None | Some(b'\n') => true,
                    Some(b'\r') => data.get(i + 2) == Some(&b'\n'),
                    _ => false,
                };
                if followed_by_eol {
                    let _ = write!(result, "={byte:02X}");
                    line_length += 3;
                } else {
                    result.push(byte as char);
                    line_length += 1;
                }
            }
            _ => {
                let _ = write!(result, "={byte:02X}");
                line_length += 3;
            }
        }

        i += 1;
    }

    (result, breaks)
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// Operates on bytes rather than `str` since the decoded content is not
/// necessarily UTF-8 until charset transcoding (see [`Charset`]) is applied.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0usize;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break: "=\r\n" or "=\n" joins the next line onto this one.
        if data.get(i + 1) == Some(&b'\r') && data.get(i + 2) == Some(&b'\n') {
            i += 3;
            continue;
        }
        if data.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let hex = data
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex_str = std::str::from_utf8(hex)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        let value = u8::from_str_radix(hex_str, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(value);
        i += 3;
    }

    Ok(result)
}

/// Maximum number of encoded octets per RFC 2047 word (75, including the
/// `=?charset?enc??=` wrapper).
const RFC2047_MAX_ENCODED_WORD: usize = 75;

/// Encodes a header value using RFC 2047 `B` (base64) encoding, splitting
/// into multiple encoded-words if the result would exceed
/// [`RFC2047_MAX_ENCODED_WORD`] octets.
///
/// Format: `=?charset?B?encoded-text?=`
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_rfc2047(text: &str, charset: &str) -> Result<String> {
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return Ok(text.to_string());
    }

    let prefix_len = charset.len() + "=???B??=".len();
    let max_raw_per_word = (RFC2047_MAX_ENCODED_WORD.saturating_sub(prefix_len) / 4) * 3;
    let max_raw_per_word = max_raw_per_word.max(3);

    let bytes = text.as_bytes();
    if bytes.len() <= max_raw_per_word {
        let encoded = encode_base64(bytes);
        return Ok(format!("=?{charset}?B?{encoded}?="));
    }

    let mut words = Vec::new();
    for chunk in bytes.chunks(max_raw_per_word) {
        let encoded = encode_base64(chunk);
        words.push(format!("=?{charset}?B?{encoded}?="));
    }
    Ok(words.join(" "))
}

/// Decodes an RFC 2047 encoded header word.
///
/// Format: `=?charset?encoding?encoded-text?=`. The decoded bytes are
/// transcoded from `charset` via [`Charset`]; unrecognized charsets fall
/// back to lossy UTF-8.
///
/// # Errors
///
/// Returns an error if the input looks like an encoded word but its
/// encoding marker is neither `B` nor `Q`.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    if !text.starts_with("=?") || !text.ends_with("?=") {
        return Ok(text.to_string());
    }

    let inner = &text[2..text.len() - 2];
    let parts: Vec<&str> = inner.splitn(3, '?').collect();

    let [charset_name, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    let charset = Charset::from_name(charset_name).unwrap_or(Charset::Utf8);

    let decoded_bytes = match encoding.to_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        "Q" => {
            let with_spaces = encoded_text.replace('_', " ");
            decode_quoted_printable(with_spaces.as_bytes())?
        }
        other => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {other}"
            )));
        }
    };

    Ok(charset.decode(&decoded_bytes))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_quoted_printable_encode() {
        let text = "Hello, World!";
        let encoded = encode_quoted_printable(text);
        assert_eq!(encoded, "Hello, World!");

        let text = "Héllo, Wørld!";
        let encoded = encode_quoted_printable(text);
        assert!(encoded.contains("=C3"));
    }

    #[test]
    fn test_quoted_printable_encode_trailing_space() {
        let (encoded, breaks) = encode_quoted_printable_ex(b"Hi \n", false);
        assert_eq!(encoded, "Hi=20\r\n");
        assert_eq!(breaks, vec![LineBreak::Hard(3)]);
    }

    #[test]
    fn test_quoted_printable_decode() {
        let encoded = b"Hello, World!";
        let decoded = decode_quoted_printable(encoded).unwrap();
        assert_eq!(decoded, b"Hello, World!");

        let encoded = b"H=C3=A9llo";
        let decoded = decode_quoted_printable(encoded).unwrap();
        assert_eq!(decoded, "Héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let encoded = b"Hello=\r\nWorld";
        let decoded = decode_quoted_printable(encoded).unwrap();
        assert_eq!(decoded, b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_roundtrip_ascii() {
        let original = b"line one\nline two\n";
        let (encoded, _) = encode_quoted_printable_ex(original, false);
        let decoded = decode_quoted_printable(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_rfc2047_encode() {
        let text = "Hello";
        let encoded = encode_rfc2047(text, "utf-8").unwrap();
        assert_eq!(encoded, "Hello"); // No encoding needed

        let text = "Héllo";
        let encoded = encode_rfc2047(text, "utf-8").unwrap();
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_rfc2047_encode_splits_long_words() {
        let text = "x".repeat(200);
        let encoded = encode_rfc2047(&text, "utf-8").unwrap();
        assert!(encoded.split(' ').count() > 1);
        for word in encoded.split(' ') {
            assert!(word.len() <= RFC2047_MAX_ENCODED_WORD);
        }
    }

    #[test]
    fn test_rfc2047_decode() {
        let encoded = "Hello";
        let decoded = decode_rfc2047(encoded).unwrap();
        assert_eq!(decoded, "Hello");

        let encoded = "=?utf-8?B?SMOpbGxv?=";
        let decoded = decode_rfc2047(encoded).unwrap();
        assert_eq!(decoded, "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        let encoded = "=?utf-8?Q?H=C3=A9llo?=";
        let decoded = decode_rfc2047(encoded).unwrap();
        assert_eq!(decoded, "Héllo");
    }

    #[test]
    fn test_rfc2047_decode_non_utf8_charset() {
        // 0xA1 in TIS-620/windows-874 is U+0E01.
        let encoded = "=?tis-620?Q?=A1?=";
        let decoded = decode_rfc2047(encoded).unwrap();
        assert_eq!(decoded, "\u{0E01}");
    }
}
