//! Pacing scheduler: frame-driven, backlog-adaptive reveal.
//!
//! Every frame converts elapsed time into a fractional character budget at
//! a rate chosen from the current backlog, then withdraws at most
//! `step_cap` whole characters. Heavy backlog makes the text move more
//! often, never in bigger jumps.

use super::queue::ContentQueue;
use std::time::Duration;
use tracing::trace;

/// Backlog threshold and the rate that applies above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateTier {
    /// The tier applies when the backlog is strictly greater than this.
    pub above: usize,
    /// Reveal rate in characters per second.
    pub chars_per_second: f64,
}

impl RateTier {
    /// Create a tier.
    pub const fn new(above: usize, chars_per_second: f64) -> Self {
        Self {
            above,
            chars_per_second,
        }
    }
}

/// Configuration for the pacing scheduler.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Rate tiers, checked in order. Keep them sorted by descending `above`.
    pub tiers: Vec<RateTier>,
    /// Rate used when no tier matches.
    pub base_rate: f64,
    /// Hard limit on characters revealed in one frame.
    pub step_cap: usize,
    /// Time between frames (e.g., 16ms for ~60 FPS).
    pub frame_interval: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                RateTier::new(2400, 34.0),
                RateTier::new(1400, 29.0),
                RateTier::new(800, 26.0),
                RateTier::new(350, 22.0),
            ],
            base_rate: 17.0,
            step_cap: 3,
            frame_interval: Duration::from_micros(16_667),
        }
    }
}

impl PacingConfig {
    /// Reveal rate for the given backlog.
    pub fn rate_for_backlog(&self, backlog: usize) -> f64 {
        self.tiers
            .iter()
            .find(|tier| backlog > tier.above)
            .map_or(self.base_rate, |tier| tier.chars_per_second)
    }
}

/// Lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Nothing to do yet. Frames are ignored.
    Idle,
    /// Ticking while the transport is still open.
    Scheduled,
    /// Transport finished; ticking until the queue is empty.
    Draining,
    /// Terminal. Either drained or cancelled.
    Stopped,
}

impl SchedulerState {
    /// Whether frames should currently be delivered.
    pub const fn wants_frames(self) -> bool {
        matches!(self, Self::Scheduled | Self::Draining)
    }
}

/// Result of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStep {
    /// Text withdrawn this frame (possibly empty).
    pub revealed: String,
    /// Number of characters in `revealed`.
    pub chars: usize,
    /// True on the frame that emptied the queue after the transport finished.
    pub drained: bool,
}

/// Frame-paced consumer of a [`ContentQueue`].
#[derive(Debug)]
pub struct PacingScheduler {
    config: PacingConfig,
    state: SchedulerState,
    /// Timestamp of the previous frame.
    last_frame: Option<Duration>,
    /// Fractional characters earned but not yet spent.
    budget: f64,
    frames: u64,
}

impl PacingScheduler {
    /// Create an idle scheduler.
    pub const fn new(config: PacingConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            last_frame: None,
            budget: 0.0,
            frames: 0,
        }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Current state.
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Unspent fractional budget.
    pub const fn budget(&self) -> f64 {
        self.budget
    }

    /// Frames processed so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Request frames. Only an idle scheduler is affected, so redundant
    /// requests never schedule twice.
    ///
    /// Returns `true` if this call started the scheduler.
    pub fn ensure_scheduled(&mut self) -> bool {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Scheduled;
            return true;
        }
        false
    }

    /// The transport will deliver nothing more; drain and stop.
    pub fn transport_finished(&mut self) {
        if matches!(self.state, SchedulerState::Idle | SchedulerState::Scheduled) {
            self.state = SchedulerState::Draining;
        }
    }

    /// Stop without draining.
    pub fn cancel(&mut self) {
        self.state = SchedulerState::Stopped;
    }

    /// Run one frame at time `now` (monotonic, any fixed origin).
    ///
    /// The first frame counts as zero elapsed time.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn on_frame(&mut self, now: Duration, queue: &mut ContentQueue) -> FrameStep {
        if !self.state.wants_frames() {
            return FrameStep::default();
        }
        self.frames += 1;

        let elapsed = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_frame = Some(now);

        let rate = self.config.rate_for_backlog(queue.queued_chars());
        self.budget += elapsed.as_secs_f64() * rate;

        let mut step = FrameStep::default();
        if queue.queued_chars() > 0 {
            let allowance = (self.budget.floor() as usize).min(self.config.step_cap);
            if allowance > 0 {
                let before = queue.queued_chars();
                step.revealed = queue.withdraw(allowance);
                step.chars = before - queue.queued_chars();
                // Spend only what was used; the fraction carries over
                self.budget = (self.budget - step.chars as f64).max(0.0);
            }
        }

        if queue.is_empty() && self.state == SchedulerState::Draining {
            self.state = SchedulerState::Stopped;
            step.drained = true;
        }

        if step.chars > 0 {
            trace!(chars = step.chars, backlog = queue.queued_chars(), rate, "revealed");
        }
        step
    }
}
