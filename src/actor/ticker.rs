//! Ticker Actor: Dedicated thread that paces the reveal.
//!
//! The ticker stands in for a display refresh cycle. It sends one
//! [`Tick`] per frame while alive. It is spawned when the pacing scheduler
//! first wants frames and shut down as soon as it stops, so no frame
//! callback outlives its session.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A frame event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Sequence number, starting at 0.
    pub frame: u64,
    /// Time since the ticker thread started. Fed to the scheduler as `now`.
    pub elapsed: Duration,
}

/// Ticker actor that generates frame events.
pub struct TickerActor {
    /// Joined on [`join`](Self::join).
    handle: Option<JoinHandle<()>>,
    /// Dropping or sending on this wakes the thread and stops it.
    shutdown_tx: Option<Sender<()>>,
    tick_rx: Receiver<Tick>,
}

impl TickerActor {
    /// Start ticking every `interval`. The first tick arrives one interval
    /// after spawn.
    pub fn spawn(interval: Duration) -> io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        // Small buffer - a slow consumer skips frames instead of queuing them
        let (tick_tx, tick_rx) = bounded(2);

        let handle = thread::Builder::new()
            .name("inkstream-ticker".to_string())
            .spawn(move || {
                Self::run_loop(&tick_tx, &shutdown_rx, interval);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
            tick_rx,
        })
    }

    /// Get a reference to the tick receiver, for use with `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Tick> {
        &self.tick_rx
    }

    /// Signal the ticker to stop. Takes effect immediately, even mid-sleep.
    pub fn shutdown(&mut self) {
        // Disconnecting the channel wakes the sleeping thread
        self.shutdown_tx.take();
    }

    /// Stop the ticker and wait for its thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Tick until shut down or the receiver is gone.
    fn run_loop(tick_tx: &Sender<Tick>, shutdown_rx: &Receiver<()>, interval: Duration) {
        let start = Instant::now();
        let mut frame = 0u64;
        let mut next_tick = start + interval;

        loop {
            let now = Instant::now();
            if now < next_tick {
                match shutdown_rx.recv_timeout(next_tick - now) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                continue;
            }

            let tick = Tick {
                frame,
                elapsed: now - start,
            };

            // Non-blocking send - if the buffer is full, skip this frame
            if let Err(TrySendError::Disconnected(_)) = tick_tx.try_send(tick) {
                break;
            }

            frame += 1;
            next_tick += interval;

            // Behind schedule: resync instead of bursting
            if next_tick < now {
                next_tick = now + interval;
            }
        }
    }
}

impl Drop for TickerActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
