//! MIME decomposer for inbound IMAP FETCH body parts.
//!
//! A [`PartDecoder`] is created per body part (per `FileCtx`) once its
//! BODYSTRUCTURE-declared transfer encoding and charset are known, then fed
//! successive raw lines of FETCH body data as they arrive. It applies
//! transfer decoding (base64/quoted-printable/7bit/8bit/binary), charset
//! transcoding for text parts, and delivers decoded chunks ending in a
//! single `is_complete` marker, mirroring the chunked delivery contract of
//! the composer's own output.

use crate::charset::Charset;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::Result;
pub use crate::message::TransferEncoding;

/// Default part size above which a part is not fetched unless the caller
/// opts in (1 MiB).
pub const DEFAULT_PART_SIZE_LIMIT: usize = 1024 * 1024;

/// Largest `part_size_limit` a caller may configure per fetch (5 MiB).
pub const MAX_PART_SIZE_LIMIT: usize = 5 * 1024 * 1024;

/// Threshold above which a buffered quoted-printable soft-break remainder is
/// flushed even without a terminating hard line.
const QP_FLUSH_THRESHOLD: usize = 1024;

/// Returns whether a part's declared size should be fetched under a given
/// `part_size_limit`. Parts over the limit default to `fetch = false`; a
/// caller may still opt in per-part before body fetches begin.
#[must_use]
pub const fn should_fetch(declared_size: u32, part_size_limit: usize) -> bool {
    (declared_size as usize) <= part_size_limit
}

/// A caller-supplied hook that replaces transfer and charset decoding for
/// `text/*` parts. Receives the part's MIME subtype (e.g. `"plain"`,
/// `"html"`) and the raw (still transfer-encoded) bytes, and returns the
/// decoded text.
pub type TextDecodeHook = Box<dyn FnMut(&str, &[u8]) -> String + Send>;

/// One decoded delivery from a [`PartDecoder`].
///
/// `index` is the cumulative count of decoded bytes delivered before this
/// chunk, matching the `chunk.index == sum of sizes of delivered chunks`
/// invariant. `is_complete` is true exactly once, on the final, empty,
/// delivery.
#[derive(Debug, Clone, Default)]
pub struct DecodedChunk {
    /// Decoded bytes for this chunk. Empty on the final delivery.
    pub data: Vec<u8>,
    /// Cumulative decoded byte count delivered strictly before this chunk.
    pub index: usize,
    /// Set exactly once, on the last delivery for this part.
    pub is_complete: bool,
}

/// Destination for decoded part bytes: a narrow filesystem collaborator
/// mirroring open-for-write / append / close / delete at a path.
///
/// # Errors
///
/// Implementations return [`crate::Error::AttachmentSource`] (or any other
/// crate error) on I/O failure.
pub trait FileSink {
    /// Opens (creating or truncating) a file for writing decoded bytes.
    fn open_write(&mut self, path: &str) -> Result<()>;
    /// Appends a chunk of decoded bytes to the currently open file.
    fn append(&mut self, path: &str, data: &[u8]) -> Result<()>;
    /// Closes the file, flushing any buffered bytes.
    fn close(&mut self, path: &str) -> Result<()>;
    /// Removes a previously written file, e.g. after an aborted fetch.
    fn remove(&mut self, path: &str) -> Result<()>;
}

/// Streaming per-part decoder. One instance is created per body part fetch
/// and fed successive raw lines from the FETCH response until the part's
/// closing trailer is observed, at which point [`Self::finish`] delivers the
/// final `is_complete` chunk.
pub struct PartDecoder {
    encoding: TransferEncoding,
    text_part: bool,
    charset: Charset,
    mime_subtype: String,
    hook: Option<TextDecodeHook>,
    qp_buffer: Vec<u8>,
    total_read: usize,
    decoded_len: usize,
    index: usize,
    finished: bool,
}

impl PartDecoder {
    /// Creates a decoder for a part with the given transfer encoding and,
    /// when `text_part` is set, the charset to transcode decoded bytes from.
    #[must_use]
    pub fn new(
        encoding: TransferEncoding,
        text_part: bool,
        charset: Charset,
        mime_subtype: impl Into<String>,
    ) -> Self {
        Self {
            encoding,
            text_part,
            charset,
            mime_subtype: mime_subtype.into(),
            hook: None,
            qp_buffer: Vec::new(),
            total_read: 0,
            decoded_len: 0,
            index: 0,
            finished: false,
        }
    }

    /// Registers a per-part text-decoding hook, replacing transfer+charset
    /// decoding for this part if it is a `text_part`.
    #[must_use]
    pub fn with_text_hook(mut self, hook: TextDecodeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Total raw (still-encoded) bytes fed so far.
    #[must_use]
    pub const fn total_read(&self) -> usize {
        self.total_read
    }

    /// Total decoded bytes delivered so far.
    #[must_use]
    pub const fn decoded_len(&self) -> usize {
        self.decoded_len
    }

    /// Feeds one raw line (including its trailing CRLF, if present) of FETCH
    /// body data. Returns zero or more decoded chunks ready for delivery;
    /// quoted-printable soft-break continuations are buffered internally and
    /// may produce no chunk until a later line or [`Self::finish`] flushes
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be decoded under the part's
    /// declared transfer encoding.
    pub fn feed_line(&mut self, line: &[u8]) -> Result<Vec<DecodedChunk>> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.total_read += line.len();

        match self.encoding {
            TransferEncoding::QuotedPrintable => self.feed_quoted_printable(line),
            TransferEncoding::Base64 => self.feed_base64(line),
            TransferEncoding::SevenBit
            | TransferEncoding::EightBit
            | TransferEncoding::Binary
            | TransferEncoding::Undefined => {
                let chunk = self.emit(line.to_vec())?;
                Ok(vec![chunk])
            }
        }
    }

    fn feed_quoted_printable(&mut self, line: &[u8]) -> Result<Vec<DecodedChunk>> {
        self.qp_buffer.extend_from_slice(line);

        let ends_soft_break = ends_with_soft_break(&self.qp_buffer);
        if ends_soft_break && self.qp_buffer.len() <= QP_FLUSH_THRESHOLD {
            return Ok(Vec::new());
        }

        let raw = std::mem::take(&mut self.qp_buffer);
        let decoded = decode_quoted_printable(&raw)?;
        Ok(vec![self.emit(decoded)?])
    }

    fn feed_base64(&mut self, line: &[u8]) -> Result<Vec<DecodedChunk>> {
        let text: String = line
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|&b| b as char)
            .collect();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let decoded = decode_base64(&text)?;
        Ok(vec![self.emit(decoded)?])
    }

    fn emit(&mut self, decoded: Vec<u8>) -> Result<DecodedChunk> {
        let data = if self.text_part {
            let text = match &mut self.hook {
                Some(hook) => hook(&self.mime_subtype, &decoded),
                None => self.charset.decode(&decoded),
            };
            text.into_bytes()
        } else {
            decoded
        };

        let index = self.index;
        self.index += data.len();
        self.decoded_len += data.len();
        Ok(DecodedChunk {
            data,
            index,
            is_complete: false,
        })
    }

    /// Signals that the part's trailer has been observed: flushes any
    /// buffered quoted-printable remainder and returns the final, empty,
    /// `is_complete` chunk. Idempotent after the first call.
    ///
    /// # Errors
    ///
    /// Returns an error if a buffered soft-break remainder fails to decode.
    pub fn finish(&mut self) -> Result<Vec<DecodedChunk>> {
        if self.finished {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        if !self.qp_buffer.is_empty() {
            let raw = std::mem::take(&mut self.qp_buffer);
            let decoded = decode_quoted_printable(&raw)?;
            out.push(self.emit(decoded)?);
        }
        self.finished = true;
        out.push(DecodedChunk {
            data: Vec::new(),
            index: self.index,
            is_complete: true,
        });
        Ok(out)
    }
}

/// Returns whether a buffered quoted-printable chunk ends with a soft-break
/// joiner (`=\r\n` or bare `=\n`) that must be joined to the next line before
/// decoding.
fn ends_with_soft_break(buf: &[u8]) -> bool {
    if let Some(rest) = buf.strip_suffix(b"\r\n") {
        return rest.ends_with(b"=");
    }
    if let Some(rest) = buf.strip_suffix(b"\n") {
        return rest.ends_with(b"=");
    }
    false
}

/// Decodes a complete, already-buffered part in one call: splits `raw` into
/// CRLF/LF-terminated lines, feeds them through a fresh [`PartDecoder`], and
/// concatenates every non-empty delivered chunk. Used when the transport
/// layer (an IMAP literal) has already buffered the whole part, so there is
/// no need to drive [`PartDecoder::feed_line`] incrementally.
///
/// # Errors
///
/// Returns an error if any line fails to decode under `encoding`.
pub fn decode_full(
    encoding: TransferEncoding,
    text_part: bool,
    charset: Charset,
    mime_subtype: &str,
    raw: &[u8],
) -> Result<Vec<u8>> {
    let mut decoder = PartDecoder::new(encoding, text_part, charset, mime_subtype);
    let mut out = Vec::new();
    for line in split_keeping_newline(raw) {
        for chunk in decoder.feed_line(line)? {
            out.extend_from_slice(&chunk.data);
        }
    }
    for chunk in decoder.finish()? {
        out.extend_from_slice(&chunk.data);
    }
    Ok(out)
}

/// Feeds an already-buffered part through a [`PartDecoder`] and a
/// [`FileSink`], delivering every chunk (including the final `is_complete`
/// marker) to `sink` at `path`.
///
/// # Errors
///
/// Returns an error if decoding fails or the sink rejects a write.
pub fn decode_full_to_sink<S: FileSink>(
    mut decoder: PartDecoder,
    raw: &[u8],
    sink: &mut S,
    path: &str,
) -> Result<()> {
    sink.open_write(path)?;
    for line in split_keeping_newline(raw) {
        for chunk in decoder.feed_line(line)? {
            if !chunk.data.is_empty() {
                sink.append(path, &chunk.data)?;
            }
        }
    }
    for chunk in decoder.finish()? {
        if !chunk.data.is_empty() {
            sink.append(path, &chunk.data)?;
        }
    }
    sink.close(path)
}

fn split_keeping_newline(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in data.iter().enumerate() {
        if b == b'\n' {
            lines.push(&data[start..=i]);
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct MemorySink {
        files: std::collections::HashMap<String, Vec<u8>>,
        closed: std::collections::HashSet<String>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                files: std::collections::HashMap::new(),
                closed: std::collections::HashSet::new(),
            }
        }
    }

    impl FileSink for MemorySink {
        fn open_write(&mut self, path: &str) -> Result<()> {
            self.files.insert(path.to_string(), Vec::new());
            Ok(())
        }

        fn append(&mut self, path: &str, data: &[u8]) -> Result<()> {
            self.files.entry(path.to_string()).or_default().extend_from_slice(data);
            Ok(())
        }

        fn close(&mut self, path: &str) -> Result<()> {
            self.closed.insert(path.to_string());
            Ok(())
        }

        fn remove(&mut self, path: &str) -> Result<()> {
            self.files.remove(path);
            Ok(())
        }
    }

    #[test]
    fn decodes_base64_part() {
        let raw = b"aGVsbG8gd29ybGQ=\r\n";
        let decoded = decode_full(TransferEncoding::Base64, false, Charset::Utf8, "", raw).unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn decodes_quoted_printable_soft_break() {
        let raw = b"this is a soft=\r\nbreak\r\n";
        let decoded =
            decode_full(TransferEncoding::QuotedPrintable, true, Charset::Utf8, "plain", raw).unwrap();
        assert_eq!(decoded, b"this is a softbreak");
    }

    #[test]
    fn sevenbit_is_passthrough() {
        let raw = b"hello\r\nworld\r\n";
        let decoded = decode_full(TransferEncoding::SevenBit, false, Charset::Utf8, "", raw).unwrap();
        assert_eq!(decoded, b"hello\r\nworld\r\n");
    }

    #[test]
    fn text_hook_overrides_charset_decode() {
        let hook: TextDecodeHook = Box::new(|subtype, bytes| format!("[{subtype}]{}", String::from_utf8_lossy(bytes)));
        let mut decoder = PartDecoder::new(TransferEncoding::SevenBit, true, Charset::Utf8, "plain")
            .with_text_hook(hook);
        let chunks = decoder.feed_line(b"hi").unwrap();
        assert_eq!(chunks[0].data, b"[plain]hi");
    }

    #[test]
    fn delivers_final_is_complete_chunk() {
        let mut decoder = PartDecoder::new(TransferEncoding::SevenBit, false, Charset::Utf8, "");
        let mut chunks = decoder.feed_line(b"abc").unwrap();
        chunks.extend(decoder.finish().unwrap());
        assert!(!chunks[0].is_complete);
        assert_eq!(chunks[0].index, 0);
        assert!(chunks.last().unwrap().is_complete);
        assert!(chunks.last().unwrap().data.is_empty());
        assert_eq!(chunks.last().unwrap().index, 3);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut decoder = PartDecoder::new(TransferEncoding::SevenBit, false, Charset::Utf8, "");
        let first = decoder.finish().unwrap();
        let second = decoder.finish().unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn size_policy_gates_large_parts() {
        assert!(should_fetch(1024, DEFAULT_PART_SIZE_LIMIT));
        assert!(!should_fetch((DEFAULT_PART_SIZE_LIMIT + 1) as u32, DEFAULT_PART_SIZE_LIMIT));
        assert!(should_fetch((DEFAULT_PART_SIZE_LIMIT + 1) as u32, MAX_PART_SIZE_LIMIT));
    }

    #[test]
    fn decode_full_to_sink_writes_and_closes() {
        let mut sink = MemorySink::new();
        let decoder = PartDecoder::new(TransferEncoding::SevenBit, false, Charset::Utf8, "");
        decode_full_to_sink(decoder, b"hello\r\n", &mut sink, "/Inbox/1/body.txt").unwrap();
        assert_eq!(sink.files["/Inbox/1/body.txt"], b"hello\r\n");
        assert!(sink.closed.contains("/Inbox/1/body.txt"));
    }
}
