//! Reader Actor: Dedicated thread for consuming the response body.
//!
//! This actor blocks on the body, reassembles lines, parses them, and
//! forwards events to the render loop so that slow reads never stall
//! the reveal (and a slow reveal never stalls reading).

use super::messages::ReaderMessage;
use crate::protocol::{parse_line, LineReassembler, ProtocolEvent};
use crossbeam_channel::Sender;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Reader actor that drains a response body.
///
/// The read itself cannot be interrupted. Dropping the handle detaches the
/// thread; it exits on its own once the body ends, fails, or the receiver
/// is gone.
pub struct ReaderActor {
    /// Handle to the reader thread.
    handle: Option<JoinHandle<()>>,
}

impl ReaderActor {
    /// Spawn the reader actor thread.
    ///
    /// # Arguments
    ///
    /// * `body` - The response body to read.
    /// * `sender` - Channel to send decoded events to the render loop.
    /// * `chunk_size` - Read buffer size in bytes.
    pub fn spawn<R>(body: R, sender: Sender<ReaderMessage>, chunk_size: usize) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("inkstream-reader".to_string())
            .spawn(move || {
                Self::run_loop(body, &sender, chunk_size);
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the reader thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main read loop.
    fn run_loop<R: Read>(mut body: R, sender: &Sender<ReaderMessage>, chunk_size: usize) {
        let mut framer = LineReassembler::new();
        let mut chunk = vec![0u8; chunk_size.max(1)];
        let mut total = 0u64;

        loop {
            match body.read(&mut chunk) {
                Ok(0) => {
                    framer.finish();
                    if Self::forward_lines(&mut framer, sender) {
                        debug!(bytes = total, "response body ended");
                        let _ = sender.send(ReaderMessage::Ended { bytes: total });
                    }
                    return;
                }
                Ok(n) => {
                    total += n as u64;
                    framer.push_bytes(&chunk[..n]);
                    if !Self::forward_lines(&mut framer, sender) {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, bytes = total, "response body read failed");
                    let _ = sender.send(ReaderMessage::Failed(e));
                    return;
                }
            }
        }
    }

    /// Send every complete line's event. Returns `false` when reading
    /// should stop: the receiver is gone or a fatal event was sent.
    fn forward_lines(framer: &mut LineReassembler, sender: &Sender<ReaderMessage>) -> bool {
        for line in framer.lines() {
            let Some(event) = parse_line(&line) else {
                continue;
            };

            let fatal = matches!(event, ProtocolEvent::Error(_));
            if sender.send(ReaderMessage::Event(event)).is_err() || fatal {
                return false;
            }
        }
        true
    }
}
