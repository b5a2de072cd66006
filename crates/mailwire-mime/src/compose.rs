//! MIME message composition.
//!
//! Builds RFC 5322 messages with optional HTML alternative bodies, inline
//! (related) resources, attachments, and `multipart/parallel` groups,
//! choosing the minimal MIME layout that fits what was actually added:
//!
//! - text only -> `text/plain`
//! - html only, no inline refs -> `text/html`
//! - text + html -> `multipart/alternative`
//! - html + inline resources -> `multipart/related`
//! - text + html + inline -> `multipart/alternative` wrapping a `related` html part
//! - + attachments (any of the above) -> wrapped in `multipart/mixed`
//! - + `multipart/parallel` attachments -> folded into one `parallel` sibling
//!   inside the `mixed` wrapper
//! - + nested `message/rfc822` -> embedded as an opaque sibling inside `mixed`
//!
//! Inline resources that the HTML body never references via `cid:` are
//! downgraded to ordinary attachments before the tree is built, since an
//! inline part with no referencing HTML is indistinguishable from a stray
//! attachment to any mail reader.

use crate::charset::Charset;
use crate::encoding::{encode_base64, encode_quoted_printable_ex};
use crate::header::Headers;
use std::fmt;

/// Errors specific to message composition.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// No body (text or HTML) was supplied.
    #[error("message has no body")]
    EmptyBody,

    /// An attachment's content could not be read.
    #[error("failed to read attachment {name}: {source}")]
    AttachmentRead {
        /// Attachment file name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// How an [`Attachment`] should be placed in the composed body tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentKind {
    /// An ordinary `multipart/mixed` download.
    #[default]
    Attachment,
    /// Referenced from the HTML body via `cid:`; lives in `multipart/related`.
    Inline,
    /// Grouped with other parallel attachments inside one `multipart/parallel`.
    Parallel,
}

/// A file or inline resource to attach to a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// MIME type, e.g. `"application/pdf"`.
    pub content_type: String,
    /// Raw attachment bytes.
    pub data: Vec<u8>,
    /// `Content-ID`, set when this attachment is referenced inline (e.g.
    /// `<img src="cid:...">`) rather than listed as a download.
    pub content_id: Option<String>,
    /// Where this attachment belongs in the body tree.
    pub kind: AttachmentKind,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
            content_id: None,
            kind: AttachmentKind::Attachment,
        }
    }

    /// Reads an attachment from a file on disk, guessing the MIME type from
    /// the extension (falls back to `application/octet-stream`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> std::result::Result<Self, ComposeError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ComposeError::AttachmentRead {
            name: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = guess_content_type(&filename);
        Ok(Self::new(filename, content_type, data))
    }

    /// Marks this attachment for inline (Content-ID) reference, returning
    /// the `cid:` value to use in HTML bodies. Reclassified back to a plain
    /// attachment by [`MessageBuilder::build`] if the HTML body never
    /// actually references it.
    #[must_use]
    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self.kind = AttachmentKind::Inline;
        self
    }

    /// Marks this attachment to be grouped with other `parallel` attachments
    /// under one `multipart/parallel` part, e.g. alternative renditions of
    /// the same file meant to be displayed together.
    #[must_use]
    pub const fn parallel(mut self) -> Self {
        self.kind = AttachmentKind::Parallel;
        self
    }
}

fn guess_content_type(filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Builds an RFC 5322 / MIME message from headers, bodies, and attachments.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: Option<String>,
    extra_headers: Vec<(String, String)>,
    text_body: Option<String>,
    html_body: Option<String>,
    flowed: bool,
    inline: Vec<Attachment>,
    attachments: Vec<Attachment>,
    nested_messages: Vec<(String, Vec<u8>)>,
    boundary_seed: u64,
}

impl MessageBuilder {
    /// Creates an empty message builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `From` address.
    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Adds a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Adds a `Bcc` recipient. Bcc addresses never appear in the generated
    /// header block; callers are responsible for relaying them separately
    /// to the transport (e.g. as extra `RCPT TO` commands).
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds an arbitrary header not covered by a dedicated builder method.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text_body = Some(text.into());
        self
    }

    /// Sets the HTML body, turning the message into `multipart/alternative`
    /// if a text body is also present.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Marks the text body as RFC 3676 `format=flowed` with `delsp=yes`, so
    /// soft-wrapped lines survive round-tripping through flowed-aware clients.
    #[must_use]
    pub const fn flowed(mut self, enabled: bool) -> Self {
        self.flowed = enabled;
        self
    }

    /// Adds an attachment, routing it by its [`AttachmentKind`]: `Inline`
    /// attachments become `multipart/related` parts, `Attachment` and
    /// `Parallel` attachments become `multipart/mixed` siblings (the latter
    /// folded together under one `multipart/parallel`).
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        match attachment.kind {
            AttachmentKind::Inline => self.inline.push(attachment),
            AttachmentKind::Attachment | AttachmentKind::Parallel => {
                self.attachments.push(attachment);
            }
        }
        self
    }

    /// Embeds a complete, already-composed RFC 5322 message as a nested
    /// `message/rfc822` attachment. The nested message is taken verbatim
    /// (e.g. the output of another [`MessageBuilder::build`] call) and is
    /// not re-encoded.
    #[must_use]
    pub fn rfc822(mut self, filename: impl Into<String>, raw_message: Vec<u8>) -> Self {
        self.nested_messages.push((filename.into(), raw_message));
        self
    }

    /// Returns the recipients that should receive the message but must not
    /// appear in its headers (the accumulated `Bcc` list).
    #[must_use]
    pub fn bcc_recipients(&self) -> &[String] {
        &self.bcc
    }

    /// Builds the complete message as RFC 5322 wire bytes (headers + CRLF +
    /// body), ready to hand to an SMTP `DATA` command.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EmptyBody`] if neither a text nor HTML body
    /// was set.
    pub fn build(self) -> std::result::Result<Vec<u8>, ComposeError> {
        self.build_with_progress(|_| {})
    }

    /// Builds the message exactly like [`Self::build`], additionally
    /// reporting encode progress as a percentage (`0..=100`) through
    /// `on_progress`. Progress is reported once at 0%, once at 100%, and
    /// whenever it has advanced by at least five percentage points since the
    /// last report.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EmptyBody`] if neither a text nor HTML body
    /// was set.
    pub fn build_with_progress(
        mut self,
        mut on_progress: impl FnMut(u8),
    ) -> std::result::Result<Vec<u8>, ComposeError> {
        if self.text_body.is_none() && self.html_body.is_none() {
            return Err(ComposeError::EmptyBody);
        }

        let body = self.build_body_tree();
        let mut out = Vec::new();
        self.write_top_level_headers(&mut out, &body);
        out.extend_from_slice(b"\r\n");
        body.write(&mut out);

        report_progress(out.len(), &mut on_progress);
        Ok(out)
    }

    fn next_boundary(&mut self) -> String {
        self.boundary_seed += 1;
        format!("----=_MailwireBoundary_{}", self.boundary_seed)
    }

    /// Reclassifies every inline attachment as a plain attachment when the
    /// HTML body doesn't reference any of them (no `cid:` occurs anywhere in
    /// it), or when there is no HTML body at all. An inline resource nobody
    /// references is indistinguishable from a stray download.
    fn downgrade_inline_if_unreferenced(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let referenced = self.html_body.as_deref().is_some_and(|html| html.contains("cid:"));
        if referenced {
            return;
        }
        for mut att in std::mem::take(&mut self.inline) {
            att.content_id = None;
            att.kind = AttachmentKind::Attachment;
            self.attachments.push(att);
        }
    }

    fn build_body_tree(&mut self) -> BodyNode {
        self.downgrade_inline_if_unreferenced();

        let html_node = self.html_body.take().map(|html| {
            let leaf = BodyNode::leaf_text("html", &html, false);
            if self.inline.is_empty() {
                leaf
            } else {
                let boundary = self.next_boundary();
                let mut parts = vec![leaf];
                for att in std::mem::take(&mut self.inline) {
                    parts.push(BodyNode::leaf_attachment(&att));
                }
                BodyNode::Multipart {
                    subtype: "related".to_string(),
                    boundary,
                    parts,
                }
            }
        });

        let text_node = self
            .text_body
            .take()
            .map(|text| BodyNode::leaf_text("plain", &text, self.flowed));

        let primary = match (text_node, html_node) {
            (Some(text), Some(html)) => {
                let boundary = self.next_boundary();
                BodyNode::Multipart {
                    subtype: "alternative".to_string(),
                    boundary,
                    parts: vec![text, html],
                }
            }
            (Some(text), None) => text,
            (None, Some(html)) => html,
            (None, None) => unreachable!("checked by build_with_progress"),
        };

        let mut mixed_parts = Vec::new();
        let mut parallel_parts = Vec::new();
        for att in std::mem::take(&mut self.attachments) {
            if att.kind == AttachmentKind::Parallel {
                parallel_parts.push(BodyNode::leaf_attachment(&att));
            } else {
                mixed_parts.push(BodyNode::leaf_attachment(&att));
            }
        }
        if !parallel_parts.is_empty() {
            let boundary = self.next_boundary();
            mixed_parts.push(BodyNode::Multipart {
                subtype: "parallel".to_string(),
                boundary,
                parts: parallel_parts,
            });
        }
        for (filename, raw) in std::mem::take(&mut self.nested_messages) {
            mixed_parts.push(BodyNode::leaf_rfc822(&filename, raw));
        }

        if mixed_parts.is_empty() {
            primary
        } else {
            let boundary = self.next_boundary();
            let mut parts = vec![primary];
            parts.extend(mixed_parts);
            BodyNode::Multipart {
                subtype: "mixed".to_string(),
                boundary,
                parts,
            }
        }
    }

    fn write_top_level_headers(&self, out: &mut Vec<u8>, body: &BodyNode) {
        let mut headers = Headers::new();
        if let Some(from) = &self.from {
            headers.add("From", from.clone());
        }
        if !self.to.is_empty() {
            headers.add("To", self.to.join(", "));
        }
        if !self.cc.is_empty() {
            headers.add("Cc", self.cc.join(", "));
        }
        if let Some(subject) = &self.subject {
            headers.add(
                "Subject",
                crate::encoding::encode_rfc2047(subject, "utf-8").unwrap_or_else(|_| subject.clone()),
            );
        }
        headers.add("MIME-Version", "1.0");
        for (name, value) in &self.extra_headers {
            headers.add(name.clone(), value.clone());
        }
        headers.add("Content-Type", body.content_type_header());
        if let Some(cte) = body.content_transfer_encoding() {
            headers.add("Content-Transfer-Encoding", cte);
        }

        let _ = write!(HeaderWriter(out), "{headers}");
    }
}

/// Reports encode progress over an output buffer of `len` bytes, always
/// emitting 0% and 100% and otherwise only every 5 percentage points, as if
/// `len` bytes had been written out in fixed-size chunks.
fn report_progress(len: usize, on_progress: &mut impl FnMut(u8)) {
    if len == 0 {
        on_progress(100);
        return;
    }
    const CHUNK: usize = 4096;
    let mut last_reported: i64 = -1;
    let mut index = 0usize;
    loop {
        let pct = ((index * 100) / len).min(100) as u8;
        if index == 0 || pct == 100 || i64::from(pct) - last_reported >= 5 {
            on_progress(pct);
            last_reported = i64::from(pct);
        }
        if index >= len {
            break;
        }
        index = (index + CHUNK).min(len);
    }
}

/// Adapts `Vec<u8>` to `fmt::Write` so `Headers`'s `Display` impl can be
/// written straight into the output buffer without an intermediate `String`.
struct HeaderWriter<'a>(&'a mut Vec<u8>);

impl fmt::Write for HeaderWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Internal body-part tree built by [`MessageBuilder::build`].
enum BodyNode {
    Multipart {
        subtype: String,
        boundary: String,
        parts: Vec<BodyNode>,
    },
    Leaf {
        content_type: String,
        content_transfer_encoding: Option<String>,
        extra_headers: Vec<(String, String)>,
        encoded_body: Vec<u8>,
    },
}

impl BodyNode {
    fn leaf_text(subtype: &str, text: &str, flowed: bool) -> Self {
        let (encoded, _) = encode_quoted_printable_ex(text.as_bytes(), flowed);
        let flowed_params = if flowed {
            "; format=\"flowed\"; delsp=\"yes\""
        } else {
            ""
        };
        Self::Leaf {
            content_type: format!("text/{subtype}; charset=\"utf-8\"{flowed_params}"),
            content_transfer_encoding: Some("quoted-printable".to_string()),
            extra_headers: Vec::new(),
            encoded_body: encoded.into_bytes(),
        }
    }

    fn leaf_attachment(att: &Attachment) -> Self {
        let mut extra_headers = Vec::new();
        if let Some(cid) = &att.content_id {
            extra_headers.push(("Content-ID".to_string(), format!("<{cid}>")));
            extra_headers.push((
                "Content-Disposition".to_string(),
                format!("inline; filename=\"{}\"", att.filename),
            ));
        } else {
            extra_headers.push((
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", att.filename),
            ));
        }

        let encoded_body = wrap_base64_lines(&encode_base64(&att.data));
        Self::Leaf {
            content_type: format!("{}; name=\"{}\"", att.content_type, att.filename),
            content_transfer_encoding: Some("base64".to_string()),
            extra_headers,
            encoded_body,
        }
    }

    /// A nested message embedded whole: the raw bytes are already a complete
    /// RFC 5322 document, so no further Content-Transfer-Encoding applies.
    fn leaf_rfc822(filename: &str, raw_message: Vec<u8>) -> Self {
        Self::Leaf {
            content_type: format!("message/rfc822; name=\"{filename}\""),
            content_transfer_encoding: None,
            extra_headers: vec![(
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{filename}\""),
            )],
            encoded_body: raw_message,
        }
    }

    fn content_type_header(&self) -> String {
        match self {
            Self::Multipart {
                subtype, boundary, ..
            } => format!("multipart/{subtype}; boundary=\"{boundary}\""),
            Self::Leaf { content_type, .. } => content_type.clone(),
        }
    }

    fn content_transfer_encoding(&self) -> Option<String> {
        match self {
            Self::Multipart { .. } => None,
            Self::Leaf {
                content_transfer_encoding,
                ..
            } => content_transfer_encoding.clone(),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Leaf { encoded_body, .. } => {
                out.extend_from_slice(encoded_body);
            }
            Self::Multipart {
                subtype: _,
                boundary,
                parts,
            } => {
                for part in parts {
                    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                    let mut headers = Headers::new();
                    headers.add("Content-Type", part.content_type_header());
                    if let Some(cte) = part.content_transfer_encoding() {
                        headers.add("Content-Transfer-Encoding", cte);
                    }
                    if let Self::Leaf { extra_headers, .. } = part {
                        for (name, value) in extra_headers {
                            headers.add(name.clone(), value.clone());
                        }
                    }
                    let _ = write!(HeaderWriter(out), "{headers}");
                    out.extend_from_slice(b"\r\n");
                    part.write(out);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
            }
        }
    }
}

fn wrap_base64_lines(encoded: &str) -> Vec<u8> {
    const LINE_LEN: usize = 76;
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / LINE_LEN * 2);
    let bytes = encoded.as_bytes();
    for chunk in bytes.chunks(LINE_LEN) {
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Decodes a Unicode string from raw bytes using a named charset, falling
/// back to lossy UTF-8 for unrecognized charsets. Exposed for decomposer use.
#[must_use]
pub fn decode_with_charset(bytes: &[u8], charset_name: Option<&str>) -> String {
    let charset = charset_name
        .and_then(Charset::from_name)
        .unwrap_or(Charset::Utf8);
    charset.decode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_simple_text_message() {
        let msg = MessageBuilder::new()
            .from("sender@example.com")
            .to("recipient@example.com")
            .subject("Test")
            .text_body("Hello, World!")
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("From: sender@example.com"));
        assert!(s.contains("Content-Type: text/plain"));
        assert!(s.contains("Hello, World!"));
    }

    #[test]
    fn builds_multipart_alternative() {
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("plain version")
            .html_body("<p>html version</p>")
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("multipart/alternative"));
        assert!(s.contains("plain version"));
        assert!(s.contains("html version"));
    }

    #[test]
    fn builds_with_attachment() {
        let attachment = Attachment::new("note.txt", "text/plain", b"attached data".to_vec());
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("see attached")
            .attach(attachment)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("multipart/mixed"));
        assert!(s.contains("Content-Disposition: attachment"));
        assert!(s.contains("note.txt"));
    }

    #[test]
    fn empty_body_is_rejected() {
        let result = MessageBuilder::new().from("a@example.com").build();
        assert!(matches!(result, Err(ComposeError::EmptyBody)));
    }

    #[test]
    fn bcc_never_appears_in_headers() {
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .bcc("hidden@example.com")
            .text_body("hi")
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(!s.contains("hidden@example.com"));
    }

    #[test]
    fn inline_referenced_by_cid_stays_related() {
        let logo = Attachment::new("logo.png", "image/png", b"\x89PNG".to_vec()).inline("logo1");
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("plain version")
            .html_body("<img src=\"cid:logo1\">")
            .attach(logo)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("multipart/related"));
        assert!(s.contains("multipart/alternative"));
        assert!(s.contains("Content-ID: <logo1>"));
    }

    #[test]
    fn inline_without_cid_reference_downgrades_to_attachment() {
        let logo = Attachment::new("logo.png", "image/png", b"\x89PNG".to_vec()).inline("logo1");
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("plain version")
            .html_body("<p>no image reference here</p>")
            .attach(logo)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(!s.contains("multipart/related"));
        assert!(!s.contains("Content-ID"));
        assert!(s.contains("multipart/mixed"));
        assert!(s.contains("multipart/alternative"));
        assert!(s.contains("Content-Disposition: attachment; filename=\"logo.png\""));
    }

    #[test]
    fn inline_without_html_downgrades_to_attachment() {
        let logo = Attachment::new("logo.png", "image/png", b"\x89PNG".to_vec()).inline("logo1");
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("plain only")
            .attach(logo)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(!s.contains("Content-ID"));
        assert!(s.contains("multipart/mixed"));
        assert!(s.contains("Content-Disposition: attachment; filename=\"logo.png\""));
    }

    #[test]
    fn parallel_attachments_are_grouped() {
        let a = Attachment::new("a.wav", "audio/wav", b"a".to_vec()).parallel();
        let b = Attachment::new("b.wav", "audio/wav", b"b".to_vec()).parallel();
        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("hi")
            .attach(a)
            .attach(b)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("multipart/mixed"));
        assert!(s.contains("multipart/parallel"));
        assert!(s.contains("a.wav"));
        assert!(s.contains("b.wav"));
    }

    #[test]
    fn nested_rfc822_is_embedded_as_mixed_sibling() {
        let nested = MessageBuilder::new()
            .from("inner@example.com")
            .to("inner-to@example.com")
            .text_body("inner body")
            .build()
            .unwrap();

        let msg = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("outer body")
            .rfc822("forwarded.eml", nested)
            .build()
            .unwrap();

        let s = String::from_utf8(msg).unwrap();
        assert!(s.contains("multipart/mixed"));
        assert!(s.contains("message/rfc822"));
        assert!(s.contains("inner body"));
        assert!(s.contains("outer body"));
    }

    #[test]
    fn progress_reaches_zero_and_hundred() {
        let mut reported = Vec::new();
        MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("hi")
            .build_with_progress(|pct| reported.push(pct))
            .unwrap();

        assert_eq!(reported.first().copied(), Some(0));
        assert_eq!(reported.last().copied(), Some(100));
    }
}
