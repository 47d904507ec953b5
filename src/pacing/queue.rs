//! Content queue: ordered text waiting to be revealed.
//!
//! Characters are counted as extended grapheme clusters, so a withdrawal
//! never splits what the viewer sees as one character.

use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

/// One enqueued piece of narrative text plus a consumption cursor.
#[derive(Debug, Clone)]
pub struct Fragment {
    text: String,
    /// Byte offset of the first unconsumed grapheme.
    cursor: usize,
    /// Graphemes left after `cursor`.
    remaining: usize,
}

impl Fragment {
    fn new(text: String) -> Self {
        let remaining = text.graphemes(true).count();
        Self {
            text,
            cursor: 0,
            remaining,
        }
    }

    /// The full fragment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The part not yet withdrawn.
    pub fn unconsumed(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Number of characters not yet withdrawn.
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether every character has been withdrawn.
    pub const fn is_consumed(&self) -> bool {
        self.remaining == 0
    }

    /// Take up to `max` characters from the cursor. Returns the slice and
    /// how many characters it holds.
    fn take(&mut self, max: usize) -> (&str, usize) {
        let start = self.cursor;
        let rest = &self.text[start..];

        let (end, taken) = if max >= self.remaining {
            (self.text.len(), self.remaining)
        } else {
            let end = rest
                .grapheme_indices(true)
                .nth(max)
                .map_or(self.text.len(), |(offset, _)| start + offset);
            (end, max)
        };

        self.cursor = end;
        self.remaining -= taken;
        (&self.text[start..end], taken)
    }
}

/// FIFO of pending fragments with a running character count.
///
/// Invariant: `queued_chars()` equals the sum of `remaining()` over all
/// pending fragments, and equals `total_enqueued() - total_withdrawn()`.
#[derive(Debug, Default)]
pub struct ContentQueue {
    fragments: VecDeque<Fragment>,
    queued_chars: usize,
    total_enqueued: usize,
    total_withdrawn: usize,
}

impl ContentQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Empty text is ignored.
    ///
    /// Returns the number of characters added to the backlog.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        let fragment = Fragment::new(text.into());
        let chars = fragment.remaining();
        if chars == 0 {
            return 0;
        }

        self.queued_chars += chars;
        self.total_enqueued += chars;
        self.fragments.push_back(fragment);
        chars
    }

    /// Withdraw up to `max` characters from the head, retiring fully
    /// consumed fragments.
    pub fn withdraw(&mut self, max: usize) -> String {
        let mut out = String::new();
        let mut left = max;

        while left > 0 {
            let Some(head) = self.fragments.front_mut() else {
                break;
            };

            let (piece, taken) = head.take(left);
            out.push_str(piece);
            left -= taken;
            self.queued_chars -= taken;
            self.total_withdrawn += taken;

            if head.is_consumed() {
                self.fragments.pop_front();
            }
        }

        out
    }

    /// Current backlog in characters.
    pub const fn queued_chars(&self) -> usize {
        self.queued_chars
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of pending fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// The fragment at the head, if any.
    pub fn front(&self) -> Option<&Fragment> {
        self.fragments.front()
    }

    /// Characters ever enqueued.
    pub const fn total_enqueued(&self) -> usize {
        self.total_enqueued
    }

    /// Characters ever withdrawn.
    pub const fn total_withdrawn(&self) -> usize {
        self.total_withdrawn
    }
}
