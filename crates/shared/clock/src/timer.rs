use crown_core::{Duration, Timestamp, WaiterId};
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::ManualClock;

/// Single-shot timer on a [`ManualClock`]
///
/// Delivers the clock's time at most once, then its output is exhausted.
/// A timer stopped before its deadline is reached delivers nothing. Stopping
/// is not retroactive: if the deadline was already reached, the value still
/// arrives. Dropping the timer stops it.
#[derive(Debug)]
pub struct Timer {
    output: mpsc::Receiver<Timestamp>,
    clock: Arc<ManualClock>,
    /// `None` when the deadline had already been reached at creation
    waiter: Option<WaiterId>,
    deadline: Timestamp,
}

impl Timer {
    pub(crate) fn start(clock: Arc<ManualClock>, duration: Duration) -> Self {
        let (tx, output) = mpsc::channel(1);
        // Park before spawning so a forward issued right after this call
        // already sees the timer
        let mut ticket = clock.enter_sleep(duration);
        let deadline = ticket.deadline;
        let waiter = ticket.waiter();

        let task_clock = Arc::clone(&clock);
        tokio::spawn(async move {
            // A stop removes the waiter and drops its wake sender, so only a
            // fire that happened before the stop gets through here
            if ticket.fired().await {
                // Capacity 1 and a single send, so this never finds the slot full
                if tx.try_send(task_clock.now()).is_err() {
                    debug!("[{}] Timer output dropped before delivery", task_clock.name());
                }
            } else {
                debug!("[{}] Timer stopped before deadline", task_clock.name());
            }
            // Dropping `tx` closes the output
        });

        Self {
            output,
            clock,
            waiter,
            deadline,
        }
    }

    /// Wait for the timer's value
    ///
    /// Returns `Some(time)` once when the timer fires and `None` from then on,
    /// or `None` straight away once a stopped timer has wound down.
    pub async fn recv(&mut self) -> Option<Timestamp> {
        self.output.recv().await
    }

    /// Non-blocking poll of the output
    pub fn try_recv(&mut self) -> Result<Timestamp, TryRecvError> {
        self.output.try_recv()
    }

    /// Stop the timer. Always returns `true`; repeated calls are no-ops.
    pub fn stop(&self) -> bool {
        if let Some(id) = self.waiter {
            if self.clock.deregister(id) {
                debug!("[{}] Timer {} stopped", self.clock.name(), id);
            }
        }
        true
    }

    /// Logical time at which the timer is due
    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }
}

impl Drop for Timer {
    // Nobody can read the output any more, so release the parked sleeper
    fn drop(&mut self) {
        self.stop();
    }
}
