//! Tokio codec for the reader line protocol.
//!
//! `LineCodec` adapts the pure [`Command`]/[`Event`] layer to Tokio's codec
//! traits so a session can drive a serial stream through
//! `FramedRead`/`FramedWrite`:
//!
//! ```text
//! serial stream -> Decoder -> Event   (one per non-empty line)
//! Command -> Encoder -> serial stream (bare newline, line, newline)
//! ```
//!
//! The decoder tolerates `\r\n` endings, decodes bytes lossily (a mangled
//! UTF-8 line classifies as `Unrecognized` instead of killing the stream),
//! and skips blank lines — the framing guard every client command starts
//! with produces them on loopback wiring.
//!
//! A line that grows past the configured cap without a newline is not a
//! garbled line but a broken stream, and surfaces as
//! [`Error::LineTooLong`] so the session can tear the connection down.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Event};
use lodestone_core::{Error, Result, constants::MAX_LINE_BYTES};

/// Tokio codec turning byte streams into [`Event`]s and [`Command`]s into
/// bytes.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::Decoder;
/// use lodestone_protocol::{Event, LineCodec};
///
/// let mut codec = LineCodec::new();
/// let mut buffer = BytesMut::from(&b"Tag lost: X1\r\n"[..]);
///
/// let event = codec.decode(&mut buffer).unwrap();
/// assert!(matches!(event, Some(Event::TagLost { .. })));
/// ```
#[derive(Debug)]
pub struct LineCodec {
    /// Maximum accepted line length in bytes.
    max_line_bytes: usize,
}

impl LineCodec {
    /// Create a codec with the default line length cap
    /// ([`MAX_LINE_BYTES`]).
    pub fn new() -> Self {
        Self {
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    /// Create a codec with a custom line length cap.
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    /// Get the configured line length cap.
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Event;
    type Error = Error;

    /// Extract the next event from the buffered stream.
    ///
    /// Returns `Ok(None)` when no complete line is buffered yet. Blank lines
    /// are consumed without producing an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooLong`] when a line exceeds the cap, with or
    /// without its terminating newline.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let Some(newline) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_line_bytes {
                    return Err(Error::LineTooLong {
                        length: src.len(),
                        max: self.max_line_bytes,
                    });
                }
                return Ok(None);
            };

            if newline > self.max_line_bytes {
                return Err(Error::LineTooLong {
                    length: newline,
                    max: self.max_line_bytes,
                });
            }

            let raw = src.split_to(newline + 1);
            let text = String::from_utf8_lossy(&raw[..newline]);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(Event::parse(line)));
        }
    }
}

impl Encoder<Command> for LineCodec {
    type Error = Error;

    /// Write one command, preceded by the bare framing newline.
    ///
    /// The guard newline terminates whatever partial input is sitting in the
    /// reader's buffer so the command that follows starts clean.
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        let line = item.as_line();
        dst.reserve(line.len() + 2);
        dst.put_u8(b'\n');
        dst.extend_from_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
