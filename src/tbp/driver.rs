//! Scripted TBP exchange.
//!
//! [`Driver`] plays one fixed conversation with an engine over any async
//! reader/writer pair:
//!
//! 1. read and discard the engine's `info` line;
//! 2. send `rules`, then drain lines until `ready` (bounded, see
//!    [`ReadyBound`]);
//! 3. send `start` with an empty board, pause, send `suggest`;
//! 4. if the reply has an explicitly empty `moves` list, send `suggest` once
//!    more;
//! 5. if a move was offered: `play` it, announce `new_piece`, `suggest` again;
//! 6. unless disabled, send `stop` and `quit`.
//!
//! Every line in either direction is logged at `INFO` as `TX …` / `RX …`.
//! End-of-file is logged as `RX <eof>` and is not an error; the script keeps
//! going and later writes fail if the engine has really gone. A line over the
//! codec's cap is logged at `WARN` and read as a reply with nothing in it.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::config::{
    DEFAULT_READY_MAX_LINES, DEFAULT_READY_TIMEOUT_SECS, DEFAULT_SUGGEST_DELAY_SECS,
};
use crate::models::board::Board;
use crate::models::queue::Queue;
use crate::tbp::codec::{Inbound, TbpCodec, MAX_LINE_BYTES};
use crate::tbp::messages::{self, Outbound};
use crate::Result;

/// Limits on the drain that waits for the engine's `ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyBound {
    /// Maximum number of lines read before giving up.
    pub max_lines: usize,
    /// Maximum wall-clock time spent draining.
    pub timeout: Duration,
}

impl Default for ReadyBound {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_READY_MAX_LINES,
            timeout: Duration::from_secs_f64(DEFAULT_READY_TIMEOUT_SECS),
        }
    }
}

/// How the ready drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The engine answered `ready`.
    Ready,
    /// The engine's output closed first.
    Eof,
    /// [`ReadyBound::timeout`] elapsed.
    TimedOut,
    /// [`ReadyBound::max_lines`] lines were read without a `ready`.
    LineLimit,
}

/// Parameters of one scripted exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Board sent in `start`.
    pub board: Board,
    /// Queue sent in `start`; its second piece is announced after `play`.
    pub queue: Queue,
    /// Pause between `start` and the first `suggest`.
    pub suggest_delay: Duration,
    /// Bounds on the ready drain.
    pub ready: ReadyBound,
    /// Whether to finish with `stop` and `quit`.
    pub send_stop: bool,
}

impl Script {
    /// Script with an empty `rows × cols` board and default timings.
    #[must_use]
    pub fn new(queue: Queue, rows: usize, cols: usize) -> Self {
        Self {
            board: Board::empty(rows, cols),
            queue,
            suggest_delay: Duration::from_secs_f64(DEFAULT_SUGGEST_DELAY_SECS),
            ready: ReadyBound::default(),
            send_stop: true,
        }
    }

    /// Override the pause between `start` and the first `suggest`.
    #[must_use]
    pub fn with_suggest_delay(mut self, delay: Duration) -> Self {
        self.suggest_delay = delay;
        self
    }

    /// Override the ready drain limits.
    #[must_use]
    pub fn with_ready_bound(mut self, ready: ReadyBound) -> Self {
        self.ready = ready;
        self
    }

    /// Enable or disable the closing `stop` / `quit` pair.
    #[must_use]
    pub fn with_stop(mut self, send_stop: bool) -> Self {
        self.send_stop = send_stop;
        self
    }
}

/// What happened during a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// How the ready drain ended.
    pub ready: ReadyOutcome,
    /// Whether the empty-suggestion retry was used.
    pub retried: bool,
    /// The move that was played, if the engine offered one.
    pub played: Option<Value>,
    /// Whether `stop` and `quit` were sent.
    pub stopped: bool,
}

/// Drives one engine through the scripted exchange.
pub struct Driver<R, W> {
    reader: FramedRead<R, TbpCodec>,
    writer: FramedWrite<W, TbpCodec>,
}

impl<R, W> Driver<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap the engine's output (`reader`) and input (`writer`) streams.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_line_bytes(reader, writer, MAX_LINE_BYTES)
    }

    /// Like [`Driver::new`], skipping inbound lines over `max_line_bytes`.
    #[must_use]
    pub fn with_max_line_bytes(reader: R, writer: W, max_line_bytes: usize) -> Self {
        Self {
            reader: FramedRead::new(reader, TbpCodec::with_max_line_bytes(max_line_bytes)),
            writer: FramedWrite::new(writer, TbpCodec::new()),
        }
    }

    /// Serialise `msg`, write it as one line and flush.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the engine's input is closed.
    pub async fn send(&mut self, msg: &Outbound) -> Result<()> {
        let line = msg.to_line()?;
        info!(kind = msg.kind(), "TX {line}");
        self.writer.send(line).await
    }

    /// Read the next frame from the engine; `None` at end-of-file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on a read failure.
    pub async fn recv(&mut self) -> Result<Option<Inbound>> {
        match self.reader.next().await {
            Some(Ok(Inbound::Line(line))) => {
                info!("RX {}", line.trim());
                Ok(Some(Inbound::Line(line)))
            }
            Some(Ok(Inbound::Oversized { discarded })) => {
                warn!(discarded, "RX <oversized line skipped>");
                Ok(Some(Inbound::Oversized { discarded }))
            }
            Some(Err(err)) => Err(err),
            None => {
                info!("RX <eof>");
                Ok(None)
            }
        }
    }

    /// Play the whole script.
    ///
    /// # Errors
    ///
    /// Any read or write failure aborts the script and is returned as is.
    /// Malformed or empty suggestion replies are not errors.
    pub async fn run(&mut self, script: &Script) -> Result<ProbeReport> {
        self.recv().await?;

        self.send(&Outbound::Rules).await?;
        let ready = self.drain_until_ready(script.ready).await?;
        debug!(?ready, "handshake: ready drain finished");

        self.send(&Outbound::start(script.board.clone(), script.queue.clone()))
            .await?;
        if !script.suggest_delay.is_zero() {
            tokio::time::sleep(script.suggest_delay).await;
        }

        self.send(&Outbound::Suggest).await?;
        let reply = self.recv().await?;
        let reply = reply.as_ref().and_then(Inbound::as_line);
        let mut mv = reply.and_then(messages::first_move);

        let retried = mv.is_none() && reply.is_some_and(messages::is_empty_suggestion);
        if retried {
            debug!("suggest: empty move list, asking once more");
            self.send(&Outbound::Suggest).await?;
            let reply = self.recv().await?;
            mv = reply.as_ref().and_then(Inbound::as_line).and_then(messages::first_move);
        }

        if let Some(mv) = &mv {
            self.send(&Outbound::Play { mv: mv.clone() }).await?;
            self.send(&Outbound::NewPiece {
                piece: script.queue.next_piece().to_owned(),
            })
            .await?;
            self.send(&Outbound::Suggest).await?;
            self.recv().await?;
        } else {
            info!("no move suggested, skipping play");
        }

        if script.send_stop {
            self.send(&Outbound::Stop).await?;
            self.send(&Outbound::Quit).await?;
        }

        Ok(ProbeReport {
            ready,
            retried,
            played: mv,
            stopped: script.send_stop,
        })
    }

    /// Close the engine's input and hand back its output stream.
    ///
    /// Errors from an already-broken pipe are logged and ignored. Keep the
    /// returned reader alive until the engine has exited so it can finish
    /// writing.
    pub async fn close(self) -> FramedRead<R, TbpCodec> {
        let Self { reader, mut writer } = self;
        if let Err(err) = writer.close().await {
            warn!(%err, "closing bot stdin failed, ignoring");
        }
        reader
    }

    async fn drain_until_ready(&mut self, bound: ReadyBound) -> Result<ReadyOutcome> {
        let deadline = Instant::now() + bound.timeout;

        for _ in 0..bound.max_lines {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(line) = tokio::time::timeout(remaining, self.recv()).await else {
                warn!(timeout = ?bound.timeout, "no ready within time bound, continuing");
                return Ok(ReadyOutcome::TimedOut);
            };

            match line? {
                None => return Ok(ReadyOutcome::Eof),
                Some(frame) if frame.as_line().is_some_and(messages::is_ready) => {
                    return Ok(ReadyOutcome::Ready);
                }
                Some(_) => {}
            }
        }

        warn!(max_lines = bound.max_lines, "no ready within line bound, continuing");
        Ok(ReadyOutcome::LineLimit)
    }
}
