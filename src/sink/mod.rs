//! Display sinks: where revealed text ends up.
//!
//! A render session talks to its surface only through [`DisplaySink`]:
//! raw appends while streaming, a scroll-follow request after each frame
//! that revealed something, and one final swap to structured output.
//!
//! Two sinks ship with the crate:
//!
//! - [`MemorySink`]: headless recorder, used by tests and embedders that
//!   do their own drawing.
//! - [`TerminalSink`]: writes to a terminal through crossterm, with a
//!   caret and in-place reformatting on finalize.

mod format;
mod memory;
mod terminal;

pub use format::{format_story, Paragraph, StructuredText};
pub use memory::MemorySink;
pub use terminal::{TerminalSink, TerminalSinkConfig};

use std::io;

/// A surface that displays a streaming story.
///
/// Calls arrive in this order: one [`begin`](Self::begin), any number of
/// [`append`](Self::append) / [`keep_latest_visible`](Self::keep_latest_visible)
/// pairs, and at most one [`replace_structured`](Self::replace_structured).
pub trait DisplaySink {
    /// Clear the surface and show the "still typing" caret.
    fn begin(&mut self) -> io::Result<()>;

    /// Append raw text after everything shown so far.
    ///
    /// No reformatting happens here; that is deferred to finalize.
    fn append(&mut self, text: &str) -> io::Result<()>;

    /// Make sure the newest text is in view.
    fn keep_latest_visible(&mut self) -> io::Result<()>;

    /// Replace the raw stream with the formatted story and drop the caret.
    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn begin(&mut self) -> io::Result<()> {
        (**self).begin()
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        (**self).append(text)
    }

    fn keep_latest_visible(&mut self) -> io::Result<()> {
        (**self).keep_latest_visible()
    }

    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()> {
        (**self).replace_structured(story)
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn begin(&mut self) -> io::Result<()> {
        (**self).begin()
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        (**self).append(text)
    }

    fn keep_latest_visible(&mut self) -> io::Result<()> {
        (**self).keep_latest_visible()
    }

    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()> {
        (**self).replace_structured(story)
    }
}
