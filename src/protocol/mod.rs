//! Wire protocol: framing and event dispatch.
//!
//! The response body is an event stream. Bytes are reassembled into lines
//! by [`LineReassembler`], and each line is turned into at most one
//! [`ProtocolEvent`] by [`parse_line`].
//!
//! ```text
//! bytes ──▶ Utf8StreamDecoder ──▶ LineReassembler ──▶ parse_line ──▶ ProtocolEvent
//! ```

mod event;
mod framing;

pub use event::{encode_event, parse_line, ProtocolEvent, DATA_PREFIX, DEFAULT_ERROR_MESSAGE};
pub use framing::{LineReassembler, Utf8StreamDecoder};
