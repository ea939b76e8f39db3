//! Line framing for the bot's stdio pipes.
//!
//! Every TBP message is one `\n`-terminated JSON line. Inbound lines are
//! capped at a configurable length; a line over the cap is dropped up to its
//! newline and surfaces as [`Inbound::Oversized`] so the exchange carries on
//! with the next line. A decoder error would end the `FramedRead` stream, so
//! neither an overlong line nor invalid UTF-8 is reported as one.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{AppError, Result};

/// Default inbound line cap: 16 MiB.
///
/// A 40×10 board with a long queue is a few kilobytes; suggestion replies
/// carrying full move lists stay well below a megabyte.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line, without its terminator.
    Line(String),
    /// A line longer than the cap; its bytes were discarded.
    Oversized {
        /// Bytes dropped, including the terminator when it was seen.
        discarded: usize,
    },
}

impl Inbound {
    /// Text of a complete line; `None` for a skipped one.
    #[must_use]
    pub fn as_line(&self) -> Option<&str> {
        match self {
            Self::Line(line) => Some(line),
            Self::Oversized { .. } => None,
        }
    }
}

/// Framing codec for TBP traffic.
///
/// Decoding strips a trailing `\r`, so engines that write CRLF are read
/// correctly. Encoding appends `\n` to the already-serialised message.
#[derive(Debug)]
pub struct TbpCodec {
    max_line_bytes: usize,
    /// Bytes already scanned for a newline in the current buffer.
    scanned: usize,
    /// Bytes dropped so far from an oversized line still being skipped.
    discarding: Option<usize>,
}

impl TbpCodec {
    /// Codec with the default [`MAX_LINE_BYTES`] cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }

    /// Codec that skips inbound lines longer than `max_line_bytes`.
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            max_line_bytes,
            scanned: 0,
            discarding: None,
        }
    }

    /// Drop the rest of an oversized line. Returns the frame once its
    /// newline has been consumed.
    fn skip(&mut self, src: &mut BytesMut, dropped: usize) -> Option<Inbound> {
        if let Some(pos) = src.iter().position(|b| *b == b'\n') {
            src.advance(pos + 1);
            self.discarding = None;
            Some(Inbound::Oversized {
                discarded: dropped + pos + 1,
            })
        } else {
            let len = src.len();
            src.advance(len);
            self.discarding = Some(dropped + len);
            None
        }
    }
}

impl Default for TbpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TbpCodec {
    type Item = Inbound;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        if let Some(dropped) = self.discarding {
            return Ok(self.skip(src, dropped));
        }

        let window = src.len().min(self.max_line_bytes.saturating_add(1));
        match src[self.scanned..window].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                self.scanned = 0;
                let mut line = src.split_to(end + 1);
                line.truncate(end);
                if line.last() == Some(&b'\r') {
                    line.truncate(end - 1);
                }
                Ok(Some(Inbound::Line(text(&line))))
            }
            None if src.len() > self.max_line_bytes => {
                self.scanned = 0;
                Ok(self.skip(src, 0))
            }
            None => {
                self.scanned = window;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if let Some(dropped) = self.discarding.take() {
            return Ok(Some(Inbound::Oversized { discarded: dropped }));
        }
        if src.is_empty() || src[..] == b"\r"[..] {
            src.clear();
            return Ok(None);
        }

        self.scanned = 0;
        let mut line = src.split();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Ok(Some(Inbound::Line(text(&line))))
    }
}

impl Encoder<String> for TbpCodec {
    type Error = AppError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Invalid UTF-8 is replaced rather than rejected; the line then simply
/// fails to parse as JSON.
fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
