//! Implementation for the selected state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use mailwire_mime::decompose::PartDecoder;
use mailwire_mime::{Charset, DecodedChunk};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Error;
use crate::Result;
use crate::command::{Command, FetchAttribute, FetchItems};
use crate::fetch::{ChunkState, FileCtx, ProgressState};
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{Mailbox, MailboxStatus, SeqNum, SequenceSet};

/// Size of each decoded chunk handed to a [`Client::fetch_body_part`]
/// caller. The whole part is already buffered by the IMAP literal reader;
/// this only bounds how large a single delivered chunk is.
const DELIVERY_CHUNK_SIZE: usize = 8192;

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the name of the currently selected mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.mailbox_name.as_deref().unwrap_or("INBOX")
    }

    /// Closes the current mailbox and returns to authenticated state.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Close.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            mailbox_name: None,
            mailbox_list_dirty: self.mailbox_list_dirty,
            _state: PhantomData,
        })
    }

    /// Selects a different mailbox.
    pub async fn select(mut self, mailbox: &str) -> Result<(Self, MailboxStatus)> {
        let tag = self.tag_gen.next();
        let cmd = Command::Select {
            mailbox: Mailbox::new(mailbox),
            condstore: false,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let status = Client::<S, Authenticated>::parse_mailbox_status(&responses);
        Self::check_tagged_ok(&responses, &tag)?;

        self.mailbox_name = Some(mailbox.to_string());
        Ok((self, status))
    }

    /// Searches for messages matching the given criteria.
    ///
    /// Equivalent to `search_with_options(criteria, None, false)`.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<crate::types::SeqNum>> {
        self.search_with_options(criteria, None, false).await
    }

    /// Searches for messages matching the given criteria, with an optional
    /// result-count cap and most-recent-first ordering.
    ///
    /// `limit` keeps only the last `limit` matches (IMAP SEARCH returns
    /// results in ascending sequence-number order, so "most recent" is the
    /// tail of the list). `recent_sort` additionally reverses that tail so
    /// the newest message comes first.
    pub async fn search_with_options(
        &mut self,
        criteria: &str,
        limit: Option<usize>,
        recent_sort: bool,
    ) -> Result<Vec<crate::types::SeqNum>> {
        let tag = self.tag_gen.next();
        let cmd = format!("{tag} SEARCH {criteria}\r\n");
        self.stream.write_command(cmd.as_bytes()).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut results = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Search(ids))) =
                ResponseParser::parse(response_bytes)
            {
                results.extend(ids);
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;

        if let Some(limit) = limit
            && results.len() > limit
        {
            results = results.split_off(results.len() - limit);
        }

        if recent_sort {
            results.reverse();
        }

        Ok(results)
    }

    /// Fetches message data for the given sequence set.
    ///
    /// Returns a vector of (sequence number, fetch items) pairs.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<(crate::types::SeqNum, Vec<FetchItem>)>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Fetch {
            sequence: sequence.clone(),
            items,
            uid: false,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut results = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items })) =
                ResponseParser::parse(response_bytes)
            {
                results.push((seq, items));
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(results)
    }

    /// Fetches message data using UIDs.
    ///
    /// Returns a vector of (sequence number, fetch items) pairs.
    pub async fn uid_fetch(
        &mut self,
        uid_set: &crate::types::UidSet,
        items: FetchItems,
    ) -> Result<Vec<(crate::types::SeqNum, Vec<FetchItem>)>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Fetch {
            sequence: uid_set.as_sequence_set(),
            items,
            uid: true,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut results = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items })) =
                ResponseParser::parse(response_bytes)
            {
                results.push((seq, items));
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(results)
    }

    /// Fetches and decodes one body part's octets for `seq`.
    ///
    /// Issues `FETCH n BODY.PEEK[section]` when `peek` is set (so the
    /// message's `\Seen` flag is left untouched), or `FETCH n BODY[section]`
    /// otherwise, for the section recorded on `ctx`. The returned octets are
    /// decoded through `ctx`'s declared transfer encoding (and charset, for
    /// text parts), delivered to `on_chunk` in fixed-size pieces followed by
    /// one final empty `is_complete` chunk, while `ctx`'s streaming fields
    /// (`chunk`, `progress`, `total_read`, `decoded_len`, `last_octet`) are
    /// updated to match.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the part fails to decode.
    // `pct` is derived from a `.min(100)`-clamped ratio, so the cast is safe.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn fetch_body_part(
        &mut self,
        seq: SeqNum,
        ctx: &mut FileCtx,
        peek: bool,
        mut on_chunk: impl FnMut(&DecodedChunk),
    ) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Fetch {
            sequence: SequenceSet::Single(seq),
            items: FetchItems::Items(vec![FetchAttribute::Body {
                section: Some(ctx.section.clone()),
                peek,
                partial: None,
            }]),
            uid: false,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;
        let responses = self.read_until_tagged(&tag).await?;

        let mut raw: Option<Vec<u8>> = None;
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Fetch { items, .. })) =
                ResponseParser::parse(response_bytes)
            {
                for item in items {
                    if let FetchItem::Body {
                        data: Some(data), ..
                    } = item
                    {
                        raw = Some(data);
                    }
                }
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;

        let raw = raw.unwrap_or_default();
        ctx.total_read = raw.len();

        let mime_subtype = ctx.mime.rsplit('/').next().unwrap_or("").to_string();
        let mut decoder = PartDecoder::new(
            ctx.transfer_encoding,
            ctx.text_part,
            ctx.char_encoding.unwrap_or(Charset::Utf8),
            mime_subtype,
        );

        let mut decoded = Vec::new();
        for chunk in decoder
            .feed_line(&raw)
            .map_err(|e| Error::Protocol(e.to_string()))?
        {
            decoded.extend_from_slice(&chunk.data);
        }
        for chunk in decoder.finish().map_err(|e| Error::Protocol(e.to_string()))? {
            decoded.extend_from_slice(&chunk.data);
        }

        ctx.decoded_len = decoded.len();
        let total = decoded.len().max(1);
        let mut index = 0usize;
        while index < decoded.len() {
            let end = (index + DELIVERY_CHUNK_SIZE).min(decoded.len());
            let piece = decoded[index..end].to_vec();
            let pct = ((end * 100) / total).min(100) as u8;

            ctx.progress.last_value = ctx.progress.value;
            ctx.progress.value = pct;
            ctx.chunk = ChunkState {
                data: piece.clone(),
                size: piece.len(),
                index,
                is_complete: false,
            };
            on_chunk(&DecodedChunk {
                data: piece,
                index,
                is_complete: false,
            });
            index = end;
        }

        ctx.last_octet = true;
        ctx.progress.last_value = ctx.progress.value;
        ctx.progress.value = 100;
        ctx.chunk = ChunkState {
            data: Vec::new(),
            size: 0,
            index: decoded.len(),
            is_complete: true,
        };
        on_chunk(&DecodedChunk {
            data: Vec::new(),
            index: decoded.len(),
            is_complete: true,
        });

        Ok(())
    }

    /// Permanently removes messages marked as \Deleted.
    ///
    /// Returns the sequence numbers of expunged messages.
    pub async fn expunge(&mut self) -> Result<Vec<crate::types::SeqNum>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Expunge.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut expunged = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Expunge(seq))) =
                ResponseParser::parse(response_bytes)
            {
                expunged.push(seq);
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(expunged)
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Logout.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let _ = self.read_until_tagged(&tag).await;
        Ok(())
    }
}
