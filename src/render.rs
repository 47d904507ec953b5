//! Render driver: runs a [`StreamSession`] against real threads.
//!
//! [`render_stream`] blocks the calling thread until the session settles and
//! the body ends, or until it fails. [`RenderHandle`] runs the same loop on its own thread so the
//! caller can cancel it or poll for settle.
//!
//! The loop is the only owner of the session. It selects over three
//! sources:
//!
//! - reader messages (events, end of body, read failure)
//! - ticks, only while the scheduler wants frames
//! - control messages from the owning handle

use crate::actor::{ControlMessage, ReaderActor, ReaderMessage, TickerActor};
use crate::error::RenderError;
use crate::pacing::PacingConfig;
use crate::session::{
    settle_channel, RenderHooks, RenderSummary, SettleNotifier, SettleWaiter, StreamSession,
};
use crate::sink::DisplaySink;
use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use std::io::{self, Read};
use std::panic;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Configuration for a render session.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Reveal pacing.
    pub pacing: PacingConfig,
    /// Bytes per read from the response body.
    pub read_chunk_size: usize,
    /// Events buffered between the reader and the render loop.
    pub event_capacity: usize,
    /// Format whatever is visible when the session fails or is cancelled.
    pub finalize_on_teardown: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            read_chunk_size: 8192,
            event_capacity: 256,
            finalize_on_teardown: false,
        }
    }
}

/// Render one streamed response into `sink`, blocking until it settles and
/// the body has ended.
///
/// # Errors
///
/// - [`RenderError::MissingBody`] if `body` is `None`. The sink is untouched.
/// - [`RenderError::Remote`] if the service sent an `error` event.
/// - [`RenderError::Transport`] if reading the body failed.
/// - [`RenderError::Display`] if the sink failed.
///
/// On error the scheduler is stopped and nothing more is appended.
///
/// # Example
///
/// ```
/// use inkstream::{render_stream, MemorySink, RenderHooks, RendererConfig};
/// use std::io::Cursor;
///
/// let body = Cursor::new(b"data: {\"type\":\"done\"}\n".to_vec());
/// let mut sink = MemorySink::new();
/// render_stream(Some(body), &mut sink, &RendererConfig::default(), RenderHooks::new()).unwrap();
/// assert!(sink.structured().is_some());
/// ```
pub fn render_stream<R, S>(
    body: Option<R>,
    sink: &mut S,
    config: &RendererConfig,
    hooks: RenderHooks,
) -> Result<RenderSummary, RenderError>
where
    R: Read + Send + 'static,
    S: DisplaySink + ?Sized,
{
    run_session(body, sink, config, hooks, &never(), None)
}

fn run_session<R, S>(
    body: Option<R>,
    sink: &mut S,
    config: &RendererConfig,
    hooks: RenderHooks,
    control_rx: &Receiver<ControlMessage>,
    notifier: Option<SettleNotifier>,
) -> Result<RenderSummary, RenderError>
where
    R: Read + Send + 'static,
    S: DisplaySink + ?Sized,
{
    let body = body.ok_or(RenderError::MissingBody)?;
    let started = Instant::now();

    let mut session = StreamSession::new(config.pacing.clone(), hooks);
    if let Some(notifier) = notifier {
        session = session.with_settle_notifier(notifier);
    }
    session.begin(sink)?;

    let (event_tx, event_rx) = bounded(config.event_capacity.max(1));
    // Never joined: a blocked read cannot be interrupted. The thread exits
    // once `event_rx` is dropped.
    let _reader = ReaderActor::spawn(body, event_tx, config.read_chunk_size)
        .map_err(|source| RenderError::Spawn { name: "reader", source })?;
    debug!(
        chunk_size = config.read_chunk_size,
        capacity = config.event_capacity,
        "render session started"
    );

    match drive(&mut session, sink, &event_rx, control_rx) {
        Ok(bytes_read) => {
            let summary = RenderSummary {
                bytes_read,
                elapsed: started.elapsed(),
                ..session.summary()
            };
            debug!(
                chars = summary.visible_chars,
                frames = summary.frames,
                elapsed_ms = summary.elapsed.as_millis(),
                "render session finished"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(error = %e, "render session failed");
            session.teardown(sink, config.finalize_on_teardown);
            Err(e)
        }
    }
}

/// Select loop. Returns the number of body bytes read.
///
/// Settling does not end the loop on its own: the body is read to its end
/// first, so `bytes_read` covers the whole response. Events arriving after
/// settle are not dispatched.
fn drive<S: DisplaySink + ?Sized>(
    session: &mut StreamSession,
    sink: &mut S,
    event_rx: &Receiver<ReaderMessage>,
    control_rx: &Receiver<ControlMessage>,
) -> Result<u64, RenderError> {
    // Set once nothing more will be read from the reader
    let mut reader_done = false;
    let mut ticker: Option<TickerActor> = None;
    let mut bytes_read = 0;

    let outcome = loop {
        if session.is_settled() && reader_done {
            break Ok(bytes_read);
        }

        // The ticker lives exactly as long as the scheduler wants frames
        if session.wants_frames() && ticker.is_none() {
            match TickerActor::spawn(session.frame_interval()) {
                Ok(actor) => ticker = Some(actor),
                Err(source) => break Err(RenderError::Spawn { name: "ticker", source }),
            }
        } else if !session.wants_frames() {
            if let Some(actor) = ticker.take() {
                actor.join();
            }
        }
        let ticks = ticker.as_ref().map_or_else(never, |actor| actor.receiver().clone());
        let events = if reader_done { never() } else { event_rx.clone() };

        let step = select! {
            recv(events) -> msg => match msg {
                Ok(ReaderMessage::Event(event)) if session.is_settled() => {
                    trace!(kind = event.kind(), "ignoring event after settle");
                    Ok(())
                }
                Ok(ReaderMessage::Event(event)) => session.dispatch(event),
                Ok(ReaderMessage::Ended { bytes }) => {
                    bytes_read = bytes;
                    reader_done = true;
                    session.finish_transport();
                    Ok(())
                }
                Ok(ReaderMessage::Failed(e)) => Err(RenderError::Transport(e)),
                Err(_) if session.is_settled() => {
                    reader_done = true;
                    Ok(())
                }
                Err(_) => Err(RenderError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "reader stopped before the body ended",
                ))),
            },
            recv(ticks) -> tick => match tick {
                Ok(tick) => session.on_frame(tick.elapsed, sink).map(drop),
                Err(_) => Ok(()),
            },
            recv(control_rx) -> msg => {
                if session.is_settled() {
                    // Already fully shown; stop waiting for the body to end
                    debug!(?msg, bytes_read, "owner stopped waiting for body end");
                    reader_done = true;
                    Ok(())
                } else {
                    // A dropped handle counts as abandonment
                    debug!(?msg, "render session cancelled by owner");
                    Err(RenderError::Cancelled)
                }
            },
        };

        if let Err(e) = step {
            break Err(e);
        }
    };

    if let Some(actor) = ticker.take() {
        actor.join();
    }
    outcome
}

/// A render session running on its own thread.
///
/// Dropping the handle without joining abandons the session: the render
/// thread tears down and exits, but the sink is lost.
pub struct RenderHandle<S> {
    handle: JoinHandle<(S, Result<RenderSummary, RenderError>)>,
    control_tx: Sender<ControlMessage>,
    settled: SettleWaiter,
}

impl<S> RenderHandle<S>
where
    S: DisplaySink + Send + 'static,
{
    /// Start rendering `body` into `sink` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Spawn`] if the thread cannot be started.
    /// A missing body is reported through [`join`](Self::join).
    pub fn spawn<R>(
        body: Option<R>,
        sink: S,
        config: RendererConfig,
        hooks: RenderHooks,
    ) -> Result<Self, RenderError>
    where
        R: Read + Send + 'static,
    {
        let (control_tx, control_rx) = bounded(1);
        let (notifier, settled) = settle_channel();

        let handle = thread::Builder::new()
            .name("inkstream-render".to_string())
            .spawn(move || {
                let mut sink = sink;
                let result =
                    run_session(body, &mut sink, &config, hooks, &control_rx, Some(notifier));
                (sink, result)
            })
            .map_err(|source| RenderError::Spawn { name: "render", source })?;

        Ok(Self {
            handle,
            control_tx,
            settled,
        })
    }
}

impl<S> RenderHandle<S> {
    /// Ask the session to stop. No further appends happen after the render
    /// thread observes this. After settle, this only stops the wait for the
    /// body to end.
    pub fn cancel(&self) {
        let _ = self.control_tx.try_send(ControlMessage::Cancel);
    }

    /// Whether the session has settled. Non-blocking.
    pub fn is_settled(&mut self) -> bool {
        self.settled.is_settled()
    }

    /// Whether the render thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the session to end and take the sink back.
    ///
    /// A panic on the render thread is resumed on the caller.
    pub fn join(self) -> (S, Result<RenderSummary, RenderError>) {
        let Self {
            handle, control_tx, ..
        } = self;

        let outcome = handle.join();
        // Held until here so the loop does not read a disconnect as cancel
        drop(control_tx);

        match outcome {
            Ok(outcome) => outcome,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
