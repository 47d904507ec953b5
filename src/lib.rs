//! # Inkstream
//!
//! Incremental renderer for server-streamed narrative text.
//!
//! Inkstream reads a line-oriented event stream (`data: {...}` lines),
//! queues the narrative fragments it carries, and reveals them on a display
//! surface at a steady, backlog-adaptive pace, like someone typing. When
//! the stream ends and the reveal catches up, the raw text is swapped for a
//! paragraph-structured version.
//!
//! ## Core Concepts
//!
//! - **Frame reassembly**: Arbitrary byte chunks become complete lines
//! - **Event dispatch**: Content is queued, analysis and unknown kinds go to hooks
//! - **Adaptive pacing**: Bigger backlog reveals more often, never in bigger jumps
//! - **Single finalize**: Structured output replaces the raw stream exactly once
//! - **Actor model**: Reader and ticker threads feed one render loop
//!
//! ## Example
//!
//! ```rust,no_run
//! use inkstream::{render_stream, RenderHooks, RendererConfig, TerminalSink};
//! use std::net::TcpStream;
//!
//! let body = TcpStream::connect("127.0.0.1:8080").ok();
//! let mut sink = TerminalSink::stdout();
//! let hooks = RenderHooks::new().with_first_content(|| eprintln!("streaming..."));
//!
//! match render_stream(body, &mut sink, &RendererConfig::default(), hooks) {
//!     Ok(summary) => eprintln!("{} characters", summary.visible_chars),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod error;
pub mod pacing;
pub mod protocol;
pub mod render;
pub mod session;
pub mod sink;

// Re-exports for convenience
pub use error::RenderError;
pub use pacing::{ContentQueue, PacingConfig, PacingScheduler, RateTier, SchedulerState};
pub use protocol::{encode_event, parse_line, LineReassembler, ProtocolEvent};
pub use render::{render_stream, RenderHandle, RendererConfig};
pub use session::{RenderHooks, RenderSummary, StreamSession};
pub use sink::{
    format_story, DisplaySink, MemorySink, StructuredText, TerminalSink, TerminalSinkConfig,
};
