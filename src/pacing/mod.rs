//! Pacing: the content queue and the frame-driven scheduler that drains it.
//!
//! # Architecture
//!
//! Content events push fragments into a [`ContentQueue`]. Once per frame
//! the [`PacingScheduler`] turns elapsed time into a character budget and
//! withdraws from the queue head:
//!
//! ```text
//!            push()                     on_frame(now)
//! content ─────────▶ ContentQueue ◀──────────────────── PacingScheduler
//!                    (backlog) ──── rate_for_backlog ──▶ budget ─▶ ≤ step_cap chars
//! ```
//!
//! The scheduler never looks at the clock itself; frame timestamps are
//! passed in, so it can be driven by a ticker thread or a test loop.

mod queue;
mod scheduler;

pub use queue::{ContentQueue, Fragment};
pub use scheduler::{FrameStep, PacingConfig, PacingScheduler, RateTier, SchedulerState};
