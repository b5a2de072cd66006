//! IMAP IDLE command support (RFC 2177).
//!
//! IDLE allows the client to receive real-time notifications from the server
//! about mailbox changes without polling.

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, timeout};

use super::client::{Client, Selected};
use super::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Flags, SeqNum};
use crate::{Error, Result};

/// Default interval at which [`IdleHandle::wait`] returns [`IdleEvent::Timeout`]
/// when the caller doesn't pass an explicit duration, matching common server
/// idle-disconnect windows.
pub const IDLE_DEFAULT_TIMEOUT: Duration = Duration::from_secs(8 * 60);

/// RFC 2177's recommended upper bound on how long a single IDLE command may
/// stay open before the client must send DONE and re-issue IDLE.
pub const IDLE_MAX_DURATION: Duration = Duration::from_secs(29 * 60);

/// Event received during IDLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleEvent {
    /// New message count (EXISTS response).
    Exists(u32),
    /// Message expunged (EXPUNGE response).
    Expunge(SeqNum),
    /// Message flags changed (FETCH response).
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Updated flags.
        flags: Flags,
    },
    /// Recent count changed.
    Recent(u32),
    /// Timeout occurred without receiving an event.
    Timeout,
    /// The IDLE hard cap (29 minutes) was reached; DONE was sent
    /// automatically and the caller must re-issue `idle()` to keep watching.
    ServerTimeout,
}

/// Handle for an active IDLE session.
///
/// This type holds a mutable reference to the client and manages the IDLE state.
/// Call `wait()` to receive events, and `done()` to exit IDLE mode.
///
/// Internally tracks a deadline set at [`IDLE_MAX_DURATION`] from creation;
/// once reached, `wait()` sends DONE on the caller's behalf and returns
/// [`IdleEvent::ServerTimeout`] rather than leaving the command open past the
/// point most servers will drop the connection.
pub struct IdleHandle<'a, S> {
    stream: &'a mut FramedStream<S>,
    tag: String,
    deadline: Instant,
}

impl<'a, S> IdleHandle<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new IDLE handle.
    pub(crate) fn new(stream: &'a mut FramedStream<S>, tag: String) -> Self {
        Self {
            stream,
            tag,
            deadline: Instant::now() + IDLE_MAX_DURATION,
        }
    }

    /// Waits for a server event or timeout.
    ///
    /// This method blocks until the server sends an untagged response
    /// (EXISTS, EXPUNGE, FETCH, etc.), `duration` elapses, or the IDLE hard
    /// cap is reached (in which case DONE is sent automatically).
    ///
    /// # Notes
    ///
    /// RFC 2177 recommends re-issuing IDLE every 29 minutes. Most servers
    /// have shorter timeouts (10-30 minutes), so consider using shorter
    /// timeouts in practice.
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        let now = Instant::now();
        if now >= self.deadline {
            self.send_done().await?;
            return Ok(IdleEvent::ServerTimeout);
        }

        let effective = duration.min(self.deadline - now);
        match timeout(effective, self.stream.read_response()).await {
            Ok(Ok(response)) => self.parse_event(&response),
            Ok(Err(e)) => Err(e),
            Err(_) if Instant::now() >= self.deadline => {
                self.send_done().await?;
                Ok(IdleEvent::ServerTimeout)
            }
            Err(_) => Ok(IdleEvent::Timeout),
        }
    }

    /// Waits using [`IDLE_DEFAULT_TIMEOUT`].
    pub async fn wait_default(&mut self) -> Result<IdleEvent> {
        self.wait(IDLE_DEFAULT_TIMEOUT).await
    }

    /// Parses a response into an `IdleEvent`.
    fn parse_event(&self, response: &[u8]) -> Result<IdleEvent> {
        match ResponseParser::parse(response)? {
            Response::Untagged(untagged) => match untagged {
                UntaggedResponse::Exists(n) => Ok(IdleEvent::Exists(n)),
                UntaggedResponse::Recent(n) => Ok(IdleEvent::Recent(n)),
                UntaggedResponse::Expunge(seq) => Ok(IdleEvent::Expunge(seq)),
                UntaggedResponse::Fetch { seq, items } => {
                    // Extract flags from fetch items
                    let flags = items
                        .into_iter()
                        .find_map(|item| {
                            if let crate::parser::FetchItem::Flags(f) = item {
                                Some(f)
                            } else {
                                None
                            }
                        })
                        .unwrap_or_default();
                    Ok(IdleEvent::Fetch { seq, flags })
                }
                _ => {
                    // Ignore other untagged responses during IDLE
                    // This shouldn't happen often, but we handle it gracefully
                    Ok(IdleEvent::Timeout)
                }
            },
            Response::Continuation { .. } => {
                // Continuation during IDLE is unexpected
                Err(Error::Protocol(
                    "unexpected continuation during IDLE".to_string(),
                ))
            }
            Response::Tagged {
                tag, status, text, ..
            } => {
                // If we receive a tagged response, IDLE was terminated by the server
                if tag.as_str() == self.tag {
                    match status {
                        crate::types::Status::Ok => {
                            // Server terminated IDLE normally (unusual but valid)
                            Ok(IdleEvent::Timeout)
                        }
                        crate::types::Status::No => Err(Error::No(text)),
                        crate::types::Status::Bad => Err(Error::Bad(text)),
                        crate::types::Status::Bye => Err(Error::Bye(text)),
                        crate::types::Status::PreAuth => {
                            Err(Error::Protocol("unexpected PREAUTH in IDLE".to_string()))
                        }
                    }
                } else {
                    Err(Error::Protocol(format!(
                        "unexpected tag {} during IDLE",
                        tag.as_str()
                    )))
                }
            }
        }
    }

    /// Exits IDLE mode by sending DONE.
    ///
    /// This consumes the handle and returns control to the client.
    /// After calling `done()`, the client can issue other commands.
    pub async fn done(mut self) -> Result<()> {
        self.send_done().await
    }

    /// Sends DONE and awaits the tagged response, without consuming `self`.
    ///
    /// Shared by the explicit [`IdleHandle::done`] and the auto-DONE path in
    /// [`IdleHandle::wait`] once the hard cap is reached.
    async fn send_done(&mut self) -> Result<()> {
        use crate::Command;

        let cmd = Command::Done.serialize("");
        self.stream.write_command(&cmd).await?;

        loop {
            let response = self.stream.read_response().await?;
            if let Ok(Response::Tagged {
                tag, status, text, ..
            }) = ResponseParser::parse(&response)
                && tag.as_str() == self.tag
            {
                return match status {
                    crate::types::Status::Ok => Ok(()),
                    crate::types::Status::No => Err(Error::No(text)),
                    crate::types::Status::Bad => Err(Error::Bad(text)),
                    crate::types::Status::Bye => Err(Error::Bye(text)),
                    crate::types::Status::PreAuth => {
                        Err(Error::Protocol("unexpected PREAUTH after DONE".to_string()))
                    }
                };
            }
            // Ignore untagged responses that may arrive before the tagged response
        }
    }
}

/// Extension trait for adding IDLE support to the Selected client.
impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE mode for real-time notifications.
    ///
    /// Returns an `IdleHandle` that can be used to wait for events.
    /// Call `done()` on the handle to exit IDLE mode.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut handle = client.idle().await?;
    /// loop {
    ///     match handle.wait(Duration::from_secs(600)).await? {
    ///         IdleEvent::Exists(n) => println!("New message count: {}", n),
    ///         IdleEvent::Timeout => break,
    ///         _ => {}
    ///     }
    /// }
    /// handle.done().await?;
    /// ```
    ///
    /// # Notes
    ///
    /// - Check `supports_idle()` before calling this method
    /// - IDLE should be re-issued periodically (every 10-29 minutes)
    /// - Some servers may drop idle connections after extended periods
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        use crate::Command;

        let tag = self.tag_gen.next();
        let cmd = Command::Idle.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        // Wait for continuation response
        let response = self.stream.read_response().await?;
        if !response.starts_with(b"+") {
            let parsed = ResponseParser::parse(&response)?;
            if let Response::Tagged { status, text, .. } = parsed {
                return match status {
                    crate::types::Status::No => Err(Error::No(text)),
                    crate::types::Status::Bad => Err(Error::Bad(text)),
                    _ => Err(Error::Protocol("unexpected response to IDLE".to_string())),
                };
            }
            return Err(Error::Protocol(
                "expected continuation for IDLE".to_string(),
            ));
        }

        Ok(IdleHandle::new(&mut self.stream, tag))
    }
}
