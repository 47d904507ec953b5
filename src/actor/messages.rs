//! Message types for actor communication.

use crate::protocol::ProtocolEvent;
use std::io;

/// Messages from the reader thread to the render loop.
///
/// The reader sends any number of `Event`s followed by exactly one of
/// `Ended` or `Failed`, unless it stopped early after an `error` event.
#[derive(Debug)]
pub enum ReaderMessage {
    /// A decoded protocol event, in arrival order.
    Event(ProtocolEvent),

    /// The body ended cleanly.
    Ended {
        /// Total bytes read from the body.
        bytes: u64,
    },

    /// Reading the body failed.
    Failed(io::Error),
}

/// Commands sent to a running render loop by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// The caller abandoned the session.
    Cancel,
}
