//! Headless sink that records everything it is asked to show.

use super::{DisplaySink, StructuredText};
use std::io;

/// In-memory [`DisplaySink`].
///
/// Keeps the raw stream exactly as appended, every individual append, and
/// the structured story once finalized.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    raw: String,
    appends: Vec<String>,
    structured: Option<StructuredText>,
    caret_visible: bool,
    begin_calls: usize,
    replace_calls: usize,
    scroll_requests: usize,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text appended so far.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Each append, in order.
    pub fn appends(&self) -> &[String] {
        &self.appends
    }

    /// The finalized story, if finalize ran.
    pub const fn structured(&self) -> Option<&StructuredText> {
        self.structured.as_ref()
    }

    /// Whether the caret is currently shown.
    pub const fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// How many times `begin` was called.
    pub const fn begin_calls(&self) -> usize {
        self.begin_calls
    }

    /// How many times `replace_structured` was called.
    pub const fn replace_calls(&self) -> usize {
        self.replace_calls
    }

    /// How many scroll-follow requests arrived.
    pub const fn scroll_requests(&self) -> usize {
        self.scroll_requests
    }
}

impl DisplaySink for MemorySink {
    fn begin(&mut self) -> io::Result<()> {
        self.raw.clear();
        self.appends.clear();
        self.structured = None;
        self.caret_visible = true;
        self.begin_calls += 1;
        Ok(())
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        self.raw.push_str(text);
        self.appends.push(text.to_string());
        Ok(())
    }

    fn keep_latest_visible(&mut self) -> io::Result<()> {
        self.scroll_requests += 1;
        Ok(())
    }

    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()> {
        self.structured = Some(story.clone());
        self.caret_visible = false;
        self.replace_calls += 1;
        Ok(())
    }
}
