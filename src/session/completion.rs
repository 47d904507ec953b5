//! Completion coordination.
//!
//! A session is settled when the transport has finished, the queue has
//! drained, and the finalize pass has run. The settle notification fires
//! exactly once, on the call that first observes all three.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Sending half of the settle signal. Consumed by [`notify`](Self::notify).
#[derive(Debug)]
pub struct SettleNotifier {
    tx: Sender<()>,
}

impl SettleNotifier {
    /// Fire the signal.
    pub fn notify(self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving half of the settle signal.
///
/// If the notifier is dropped without firing, the session ended without
/// settling and every wait returns `false`.
#[derive(Debug)]
pub struct SettleWaiter {
    rx: Receiver<()>,
    settled: bool,
}

impl SettleWaiter {
    /// Non-blocking check.
    pub fn is_settled(&mut self) -> bool {
        if !self.settled {
            self.settled = matches!(self.rx.try_recv(), Ok(()));
        }
        self.settled
    }

    /// Block until the session settles or ends without settling.
    pub fn wait(mut self) -> bool {
        if !self.settled {
            self.settled = self.rx.recv().is_ok();
        }
        self.settled
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        if !self.settled {
            self.settled = match self.rx.recv_timeout(timeout) {
                Ok(()) => true,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
            };
        }
        self.settled
    }

    /// Whether the session can no longer settle.
    pub fn is_abandoned(&mut self) -> bool {
        if self.settled {
            return false;
        }
        match self.rx.try_recv() {
            Ok(()) => {
                self.settled = true;
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }
}

/// Create a connected notifier/waiter pair.
pub fn settle_channel() -> (SettleNotifier, SettleWaiter) {
    let (tx, rx) = bounded(1);
    (SettleNotifier { tx }, SettleWaiter { rx, settled: false })
}

/// Tracks the three completion conditions of a session.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    transport_finished: bool,
    drained: bool,
    finalized: bool,
    settled: bool,
    notifier: Option<SettleNotifier>,
}

impl CompletionTracker {
    /// Create a tracker with no external notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker that fires `notifier` on settle.
    pub fn with_notifier(notifier: SettleNotifier) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::default()
        }
    }

    /// Record that the transport delivered everything.
    pub const fn mark_transport_finished(&mut self) {
        self.transport_finished = true;
    }

    /// Record that the queue drained after the transport finished.
    pub const fn mark_drained(&mut self) {
        self.drained = true;
    }

    /// Record that the finalize pass ran.
    pub const fn mark_finalized(&mut self) {
        self.finalized = true;
    }

    /// Settle if every condition holds.
    ///
    /// Returns `true` only on the call that settles.
    pub fn try_settle(&mut self) -> bool {
        if self.settled || !(self.transport_finished && self.drained && self.finalized) {
            return false;
        }

        self.settled = true;
        if let Some(notifier) = self.notifier.take() {
            notifier.notify();
        }
        true
    }

    /// Transport finished.
    pub const fn is_transport_finished(&self) -> bool {
        self.transport_finished
    }

    /// Queue drained.
    pub const fn is_drained(&self) -> bool {
        self.drained
    }

    /// Finalize pass ran.
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Fully settled.
    pub const fn is_settled(&self) -> bool {
        self.settled
    }
}
