//! Render session: the state one stream owns from `begin` to settle.
//!
//! A [`StreamSession`] ties the pieces together without owning any thread:
//!
//! ```text
//! ProtocolEvent ──▶ dispatch ──▶ ContentQueue ──▶ on_frame ──▶ DisplaySink
//!                      │                             │
//!                      ├─▶ hooks                     └─▶ finalize ─▶ settle
//!                      └─▶ finish_transport
//! ```
//!
//! The threaded driver in [`crate::render`] feeds it events and ticks; tests
//! feed it directly with a synthetic clock.

mod completion;
mod hooks;

pub use completion::{settle_channel, CompletionTracker, SettleNotifier, SettleWaiter};
pub use hooks::{AnalysisHook, FirstContentHook, RenderHooks, UnknownHook};

use crate::error::RenderError;
use crate::pacing::{ContentQueue, FrameStep, PacingConfig, PacingScheduler, SchedulerState};
use crate::protocol::ProtocolEvent;
use crate::sink::{format_story, DisplaySink};
use std::time::Duration;
use tracing::{debug, warn};

/// Totals reported when a session settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Characters revealed.
    pub visible_chars: usize,
    /// Non-empty content fragments received.
    pub fragments: usize,
    /// Frames processed by the scheduler.
    pub frames: u64,
    /// Bytes read from the response body.
    pub bytes_read: u64,
    /// Wall time from `begin` until the body ended after settle.
    pub elapsed: Duration,
}

/// State of one streaming render.
#[derive(Debug)]
pub struct StreamSession {
    queue: ContentQueue,
    scheduler: PacingScheduler,
    /// Everything revealed so far, exactly as appended.
    visible_text: String,
    completion: CompletionTracker,
    hooks: RenderHooks,
    first_content_seen: bool,
    fragments: usize,
}

impl StreamSession {
    /// Create a session with an idle scheduler.
    pub fn new(pacing: PacingConfig, hooks: RenderHooks) -> Self {
        Self {
            queue: ContentQueue::new(),
            scheduler: PacingScheduler::new(pacing),
            visible_text: String::new(),
            completion: CompletionTracker::new(),
            hooks,
            first_content_seen: false,
            fragments: 0,
        }
    }

    /// Fire `notifier` when the session settles.
    #[must_use]
    pub fn with_settle_notifier(mut self, notifier: SettleNotifier) -> Self {
        self.completion = CompletionTracker::with_notifier(notifier);
        self
    }

    /// Prepare the surface.
    pub fn begin<S: DisplaySink + ?Sized>(&mut self, sink: &mut S) -> Result<(), RenderError> {
        sink.begin().map_err(RenderError::Display)
    }

    /// Route one event.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Remote`] for an `error` event. The caller is
    /// expected to tear the session down.
    pub fn dispatch(&mut self, event: ProtocolEvent) -> Result<(), RenderError> {
        match event {
            ProtocolEvent::Content(text) => self.enqueue(text),
            ProtocolEvent::Analysis(payload) => {
                if let Some(hook) = self.hooks.on_analysis.as_mut() {
                    hook(&payload);
                }
            }
            ProtocolEvent::Done => self.finish_transport(),
            ProtocolEvent::Error(message) => {
                warn!(%message, "remote reported an error");
                return Err(RenderError::Remote(message));
            }
            ProtocolEvent::Unknown { kind, payload } => {
                debug!(%kind, "unrecognized event");
                if let Some(hook) = self.hooks.on_unknown.as_mut() {
                    hook(&kind, &payload);
                }
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, text: String) {
        if text.is_empty() {
            return;
        }

        if !self.first_content_seen {
            self.first_content_seen = true;
            debug!("first content received");
            if let Some(hook) = self.hooks.on_first_content.take() {
                hook();
            }
        }

        if self.queue.push(text) > 0 {
            self.fragments += 1;
            self.scheduler.ensure_scheduled();
        }
    }

    /// The transport will deliver nothing more. Idempotent.
    pub fn finish_transport(&mut self) {
        if !self.completion.is_transport_finished() {
            self.completion.mark_transport_finished();
            debug!(backlog = self.queue.queued_chars(), "transport finished");
        }
        self.scheduler.transport_finished();
    }

    /// Run one frame at `now` and push whatever it revealed to `sink`.
    ///
    /// The frame that drains the queue after the transport finished also
    /// finalizes and settles the session.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Display`] if the sink fails.
    pub fn on_frame<S: DisplaySink + ?Sized>(
        &mut self,
        now: Duration,
        sink: &mut S,
    ) -> Result<FrameStep, RenderError> {
        let step = self.scheduler.on_frame(now, &mut self.queue);

        if step.chars > 0 {
            self.visible_text.push_str(&step.revealed);
            sink.append(&step.revealed).map_err(RenderError::Display)?;
            sink.keep_latest_visible().map_err(RenderError::Display)?;
        }

        if step.drained {
            self.completion.mark_drained();
            self.finalize(sink)?;
            if self.completion.try_settle() {
                debug!(
                    chars = self.queue.total_withdrawn(),
                    frames = self.scheduler.frames(),
                    "session settled"
                );
            }
        }

        Ok(step)
    }

    /// Replace the raw stream with the formatted story.
    ///
    /// Runs at most once per session; later calls return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Display`] if the sink fails. The session still
    /// counts as finalized.
    pub fn finalize<S: DisplaySink + ?Sized>(&mut self, sink: &mut S) -> Result<bool, RenderError> {
        if self.completion.is_finalized() {
            return Ok(false);
        }
        self.completion.mark_finalized();

        let story = format_story(&self.visible_text);
        debug!(paragraphs = story.paragraphs.len(), "finalizing");
        sink.replace_structured(&story).map_err(RenderError::Display)?;
        Ok(true)
    }

    /// Stop the scheduler without draining.
    ///
    /// With `force_finalize`, whatever is visible is formatted in place.
    /// Sink failures during teardown are logged, not returned.
    pub fn teardown<S: DisplaySink + ?Sized>(&mut self, sink: &mut S, force_finalize: bool) {
        self.scheduler.cancel();
        debug!(
            dropped = self.queue.queued_chars(),
            visible = self.queue.total_withdrawn(),
            "session torn down"
        );

        if force_finalize {
            if let Err(e) = self.finalize(sink) {
                warn!(error = %e, "finalize during teardown failed");
            }
        }
    }

    /// Text revealed so far.
    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    /// The pending queue.
    pub const fn queue(&self) -> &ContentQueue {
        &self.queue
    }

    /// Scheduler state.
    pub const fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Whether the driver should be delivering frames.
    pub const fn wants_frames(&self) -> bool {
        self.scheduler.state().wants_frames()
    }

    /// Frame interval the scheduler expects.
    pub const fn frame_interval(&self) -> Duration {
        self.scheduler.config().frame_interval
    }

    /// Completion flags.
    pub const fn completion(&self) -> &CompletionTracker {
        &self.completion
    }

    /// Whether the session settled.
    pub const fn is_settled(&self) -> bool {
        self.completion.is_settled()
    }

    /// Whether any non-empty content arrived.
    pub const fn first_content_seen(&self) -> bool {
        self.first_content_seen
    }

    /// Totals so far. `bytes_read` and `elapsed` are filled in by the driver.
    pub fn summary(&self) -> RenderSummary {
        RenderSummary {
            visible_chars: self.queue.total_withdrawn(),
            fragments: self.fragments,
            frames: self.scheduler.frames(),
            ..RenderSummary::default()
        }
    }
}
