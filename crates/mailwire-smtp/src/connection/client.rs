//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use mailwire_oauth::Token;
use mailwire_oauth::sasl::{login_response, oauthbearer_response, plain_response, xoauth2_response};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = Self::read_reply(&mut stream).await?;
        if !greeting.is_success() {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        // Extract hostname from greeting (first word after code)
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Parse extensions from EHLO response (skip first line which is greeting)
        let mut extensions = HashSet::new();
        for line in reply.message.iter().skip(1) {
            extensions.insert(Extension::parse(line));
        }

        self.server_info.extensions = extensions;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let cmd = Command::StartTls;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Upgrade stream to TLS
        self.stream = self.stream.upgrade_to_tls(hostname).await?;

        // Send EHLO again after STARTTLS
        let cmd = Command::Ehlo {
            hostname: hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Re-parse extensions
        let mut extensions = HashSet::new();
        for line in reply.message.iter().skip(1) {
            extensions.insert(Extension::parse(line));
        }
        self.server_info.extensions = extensions;

        Ok(self)
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(plain_response(username, password)),
        };

        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using the two-step LOGIN mechanism (RFC 4954, legacy).
    ///
    /// Sends the username as the initial response (most servers accept
    /// SASL-IR for AUTH LOGIN) and the password as the reply to the single
    /// `334` continuation the server sends back.
    ///
    /// # Errors
    ///
    /// Returns an error if either step of authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: Some(login_response(username)),
        };
        let reply = self.send_command(cmd).await?;

        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        self.stream
            .write_all(format!("{}\r\n", login_response(password)).as_bytes())
            .await?;
        let reply = Self::read_reply(&mut self.stream).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using the `OAuth2` XOAUTH2 mechanism (Google/Microsoft).
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_xoauth2(
        mut self,
        email: &str,
        token: &Token,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::XOAuth2,
            initial_response: Some(xoauth2_response(email, &token.access_token)),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using the `OAuth2` OAUTHBEARER mechanism (RFC 7628).
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_oauthbearer(
        mut self,
        email: &str,
        token: &Token,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::OAuthBearer,
            initial_response: Some(oauthbearer_response(email, &token.access_token)),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// `message` is the full RFC 5322 message that will later be passed to
    /// [`Client::send_message`]; its bytes decide the `BODY=` and `SIZE`
    /// parameters, choosing `BINARYMIME` or `8BITMIME` only when the message
    /// actually needs it and the server advertised support for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails, or if `message`
    /// requires an extension the server did not advertise.
    pub async fn mail_from(mut self, from: Address, message: &[u8]) -> Result<Client<MailTransaction>> {
        let body = select_body_param(message, &self.server_info.extensions)?;
        let cmd = Command::MailFrom {
            from,
            body,
            size: Some(message.len()),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction. See [`Client::<Connected>::mail_from`] for
    /// how `message` drives the `BODY=`/`SIZE` parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails, or if `message`
    /// requires an extension the server did not advertise.
    pub async fn mail_from(mut self, from: Address, message: &[u8]) -> Result<Client<MailTransaction>> {
        let body = select_body_param(message, &self.server_info.extensions)?;
        let cmd = Command::MailFrom {
            from,
            body,
            size: Some(message.len()),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        let cmd = Command::RcptTo { to };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Resets the transaction and returns to authenticated/connected state.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        let cmd = Command::Rset;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        let cmd = Command::RcptTo { to };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let cmd = Command::Data;
        let reply = self.send_command(cmd).await?;

        if reply.code != ReplyCode::START_DATA {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Resets the transaction and returns to connected state.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        let cmd = Command::Rset;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Sends the message content using BDAT (RFC 3030 CHUNKING) instead of
    /// DATA/dot-stuffing.
    ///
    /// `message` is split into fixed-size chunks, each preceded by its own
    /// `BDAT <n>` command line and acknowledged individually; the last chunk
    /// is marked `LAST` and its reply carries the transaction's final status,
    /// the same way [`Client::<Data>::send_message`]'s terminating `.`
    /// carries it for the DATA path. Unlike DATA, BDAT sends raw octets with
    /// no byte-stuffing and no line-ending normalization, since chunks are
    /// framed by an explicit length rather than a terminator line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server did not advertise
    /// CHUNKING, or an SMTP error if any chunk is rejected.
    pub async fn send_chunked_data(mut self, message: &[u8]) -> Result<Client<Connected>> {
        if !self.server_info.supports_chunking() {
            return Err(Error::NotSupported(
                "server did not advertise CHUNKING".into(),
            ));
        }

        let mut reply = None;
        for (chunk, last) in chunked_with_last(message, BDAT_CHUNK_SIZE) {
            let cmd = Command::Bdat {
                size: chunk.len(),
                last,
            };
            self.stream.write_all(&cmd.serialize()).await?;
            self.stream.write_all(chunk).await?;
            reply = Some(Self::read_reply(&mut self.stream).await?);
        }

        // An empty message still needs one BDAT 0 LAST to close the transaction.
        let reply = match reply {
            Some(reply) => reply,
            None => {
                let cmd = Command::Bdat {
                    size: 0,
                    last: true,
                };
                self.stream.write_all(&cmd.serialize()).await?;
                Self::read_reply(&mut self.stream).await?
            }
        };

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

/// Upper bound on a single BDAT chunk's octet count, at the same scale as
/// the part-size limits used elsewhere in the stack.
const BDAT_CHUNK_SIZE: usize = 1024 * 1024;

/// Splits `data` into chunks of at most `chunk_size` bytes, pairing each with
/// whether it is the last chunk. Yields one empty, `last = true` chunk for
/// empty input.
fn chunked_with_last(data: &[u8], chunk_size: usize) -> Vec<(&[u8], bool)> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<&[u8]> = data.chunks(chunk_size).collect();
    let mut result = Vec::with_capacity(chunks.len());
    let last = chunks.pop();
    for chunk in chunks {
        result.push((chunk, false));
    }
    if let Some(last) = last {
        result.push((last, true));
    }
    result
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Message should be RFC 5322 formatted. Line endings will be normalized to CRLF.
    /// The terminating "." line will be added automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        // Send message with proper line ending normalization
        // and byte-stuffing (leading dots)
        for line in message.split(|&b| b == b'\n') {
            let line = if !line.is_empty() && line[line.len() - 1] == b'\r' {
                &line[..line.len() - 1]
            } else {
                line
            };

            // Byte-stuff lines starting with '.'
            if !line.is_empty() && line[0] == b'.' {
                self.stream.write_all(b".").await?;
            }

            self.stream.write_all(line).await?;
            self.stream.write_all(b"\r\n").await?;
        }

        // Send terminating sequence
        self.stream.write_all(b".\r\n").await?;

        // Read server response
        let reply = Self::read_reply(&mut self.stream).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

/// Transport requirement a message's raw octets place on the `MAIL FROM`
/// `BODY=` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyRequirement {
    /// Plain 7-bit ASCII; no `BODY=` parameter needed.
    SevenBit,
    /// Contains bytes with the high bit set, but no NUL bytes.
    EightBit,
    /// Contains NUL bytes; only safe over a `BINARYMIME` or base64-wrapped transport.
    Binary,
}

fn classify_body(message: &[u8]) -> BodyRequirement {
    let mut eight_bit = false;
    for &b in message {
        if b == 0 {
            return BodyRequirement::Binary;
        }
        if b >= 0x80 {
            eight_bit = true;
        }
    }
    if eight_bit {
        BodyRequirement::EightBit
    } else {
        BodyRequirement::SevenBit
    }
}

/// Picks the weakest `BODY=` parameter the server advertised support for
/// that still satisfies what `message` actually needs.
fn select_body_param(message: &[u8], extensions: &HashSet<Extension>) -> Result<Option<String>> {
    let requirement = classify_body(message);
    match requirement {
        BodyRequirement::SevenBit => Ok(None),
        BodyRequirement::EightBit => {
            if extensions.contains(&Extension::EightBitMime) {
                Ok(Some("8BITMIME".to_string()))
            } else {
                Err(Error::NotSupported(
                    "message contains 8-bit data but server did not advertise 8BITMIME".into(),
                ))
            }
        }
        BodyRequirement::Binary => {
            if extensions.contains(&Extension::BinaryMime) {
                Ok(Some("BINARYMIME".to_string()))
            } else if extensions.contains(&Extension::EightBitMime) {
                Ok(Some("8BITMIME".to_string()))
            } else {
                Err(Error::NotSupported(
                    "message requires BINARYMIME or 8BITMIME, neither advertised".into(),
                ))
            }
        }
    }
}

// Common implementation for all states
impl<S> Client<S> {
    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        let data = cmd.serialize();
        self.stream.write_all(&data).await?;
        Self::read_reply(&mut self.stream).await
    }

    async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = stream.read_line().await?;
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);

            if is_last {
                break;
            }
        }

        parse_reply(&lines)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let cmd = Command::Quit;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_body_plain_ascii_is_sevenbit() {
        assert_eq!(classify_body(b"hello world"), BodyRequirement::SevenBit);
    }

    #[test]
    fn classify_body_high_bit_is_eightbit() {
        assert_eq!(classify_body(b"caf\xe9"), BodyRequirement::EightBit);
    }

    #[test]
    fn classify_body_nul_byte_is_binary() {
        assert_eq!(classify_body(b"a\0b"), BodyRequirement::Binary);
    }

    #[test]
    fn chunked_with_last_splits_and_marks_final_chunk() {
        let data = vec![0u8; BDAT_CHUNK_SIZE + 10];
        let chunks = chunked_with_last(&data, BDAT_CHUNK_SIZE);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].0.len(), BDAT_CHUNK_SIZE);
        assert!(!chunks[0].1);
        assert_eq!(chunks[1].0.len(), 10);
        assert!(chunks[1].1);
    }

    #[test]
    fn chunked_with_last_single_chunk_is_marked_last() {
        let chunks = chunked_with_last(b"hello", BDAT_CHUNK_SIZE);
        assert_eq!(chunks, vec![(&b"hello"[..], true)]);
    }

    #[test]
    fn chunked_with_last_empty_input_yields_no_chunks() {
        assert!(chunked_with_last(b"", BDAT_CHUNK_SIZE).is_empty());
    }
}
