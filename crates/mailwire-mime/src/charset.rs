//! Charset transcoding for decoded header words and body text.
//!
//! Only the charsets commonly seen on the wire are handled; anything else
//! falls back to lossy UTF-8 decoding rather than failing the whole message.

/// A recognized header/body charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8 (no transcoding needed).
    Utf8,
    /// ISO-8859-1 (Latin-1): bytes map 1:1 to the first 256 Unicode code points.
    Latin1,
    /// Thai byte-range charset: TIS-620 / ISO-8859-11 / Windows-874 share a layout.
    Thai,
    /// US-ASCII, a strict subset of UTF-8.
    Ascii,
}

impl Charset {
    /// Recognizes a MIME charset name (case-insensitive, per RFC 2047/2045).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "us-ascii" | "ascii" => Some(Self::Ascii),
            "iso-8859-1" | "latin1" | "latin-1" | "l1" | "cp1252" | "windows-1252" => {
                Some(Self::Latin1)
            }
            "tis-620" | "tis620" | "iso-8859-11" | "windows-874" | "cp874" => Some(Self::Thai),
            _ => None,
        }
    }

    /// Decodes raw bytes to a `String`, transcoding as needed.
    ///
    /// Unmapped byte values (e.g. the Thai charset's undefined 0xDB..0xDE
    /// hole) are replaced with `U+FFFD`.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 | Self::Ascii => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Thai => bytes.iter().map(|&b| Self::decode_thai_byte(b)).collect(),
        }
    }

    /// Maps a single Windows-874/TIS-620/ISO-8859-11 byte to its Unicode
    /// code point. Bytes below 0xA0 are plain ASCII; 0xA0..0xDB and
    /// 0xDE..0xFB map onto the Thai block starting at U+0E00; the 0xDB..0xDE
    /// hole and 0xFB..=0xFF have no assigned character.
    fn decode_thai_byte(b: u8) -> char {
        if b < 0xA0 {
            return char::from(b);
        }
        if (0xDB..0xDE).contains(&b) || b >= 0xFB {
            return '\u{FFFD}';
        }
        char::from_u32(0x0E00 + u32::from(b - 0xA0)).unwrap_or('\u{FFFD}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_names() {
        assert_eq!(Charset::from_name("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_name("iso-8859-1"), Some(Charset::Latin1));
        assert_eq!(Charset::from_name("TIS-620"), Some(Charset::Thai));
        assert_eq!(Charset::from_name("windows-874"), Some(Charset::Thai));
        assert_eq!(Charset::from_name("klingon"), None);
    }

    #[test]
    fn decodes_latin1() {
        // 0xE9 is e-acute in Latin-1.
        assert_eq!(Charset::Latin1.decode(&[0x48, 0xE9]), "H\u{e9}");
    }

    #[test]
    fn decodes_thai_byte_range() {
        // 0xA1 -> U+0E01 (ka kai), the first Thai consonant.
        assert_eq!(Charset::Thai.decode(&[0xA1]), "\u{0E01}");
    }

    #[test]
    fn thai_hole_is_replacement_char() {
        assert_eq!(Charset::Thai.decode(&[0xDB]), "\u{FFFD}");
    }
}
