//! Actor Model: Message-passing concurrency for a render session.
//!
//! This module implements a small actor system using crossbeam channels:
//! - **Reader Actor**: Blocks on the response body, forwards protocol events
//! - **Ticker Actor**: Emits frame ticks while the reveal is running
//! - **Render Loop**: Sole owner of the session; selects over both
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ReaderMessage    ┌──────────────┐
//! │Reader Thread │ ─────────────────▶  │              │
//! └──────────────┘                     │ Render Loop  │ ──▶ DisplaySink
//!                                      │ (session)    │
//! ┌──────────────┐        Tick         │              │
//! │Ticker Thread │ ─────────────────▶  │              │
//! └──────────────┘                     └──────────────┘
//!                                            ▲
//!                                            │ ControlMessage
//!                                         caller
//! ```
//!
//! Queue mutation happens only on the render loop, so enqueue and dequeue
//! are ordered by the channel and need no locks.

mod messages;
mod reader;
mod ticker;

pub use messages::{ControlMessage, ReaderMessage};
pub use reader::ReaderActor;
pub use ticker::{Tick, TickerActor};
