use chrono::{DateTime, Utc};
use crown_core::{Duration, Timestamp, WaiterId};
use crown_ports::{Clock, ClockError, ClockResult, ControllableClock};
use log::{debug, trace, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

use crate::{CancelToken, ClockConfig, Timer, WaiterRegistry};

const DEFAULT_NAME: &str = "ManualClock";

/// Logical clock that only moves when a driver calls [`ManualClock::forward`]
///
/// Sleepers park against the clock and are woken, exactly once, by the
/// first forward that brings the current time to or past their deadline.
/// One instance per independent scenario; it is handed out behind an
/// [`Arc`] and deliberately not `Clone`, so every holder sees the same time.
#[derive(Debug)]
pub struct ManualClock {
    name: String,
    current: RwLock<Timestamp>,
    waiters: Arc<WaiterRegistry>,
    /// Every sleep call since creation, including ones that never parked
    total_sleeps: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `start`
    pub fn new(start: Timestamp) -> Arc<Self> {
        Self::with_name(start, DEFAULT_NAME)
    }

    /// Create a named clock starting at `start`
    pub fn with_name(start: Timestamp, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            current: RwLock::new(start),
            waiters: Arc::new(WaiterRegistry::new()),
            total_sleeps: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &ClockConfig) -> Arc<Self> {
        Self::with_name(config.start, config.name.clone())
    }

    /// Current logical time
    pub fn now(&self) -> Timestamp {
        *self.current.read()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advance time by `duration` and wake every sleeper that became due
    ///
    /// Forwards are serialized on the time lock and the wake pass runs
    /// before the lock is released, so concurrent drivers observe one total
    /// order of increments. Negative durations are rejected as a no-op.
    ///
    /// Returns the number of sleepers woken.
    pub fn forward(&self, duration: Duration) -> usize {
        if duration < Duration::zero() {
            warn!(
                "[{}] Ignoring forward by negative duration {}",
                self.name, duration
            );
            return 0;
        }

        let mut current = self.current.write();
        *current = saturating_add(*current, duration);
        trace!("[{}] Forward {} -> {}", self.name, duration, *current);

        self.waiters.resolve_due(*current)
    }

    /// Jump straight to the earliest pending deadline and wake what is due there
    ///
    /// Returns the number of sleepers woken, `0` if nobody is parked.
    pub fn forward_to_next(&self) -> usize {
        let mut current = self.current.write();
        // Registrations hold the read lock, so the set cannot grow while we look
        let Some(deadline) = self.waiters.next_deadline() else {
            return 0;
        };

        if deadline > *current {
            *current = deadline;
        }
        trace!("[{}] Forward to next deadline {}", self.name, *current);

        self.waiters.resolve_due(*current)
    }

    /// Suspend until the clock has moved `duration` past the current time
    pub async fn sleep(&self, duration: Duration) {
        // A token nobody else holds can never fire
        let _ = self
            .sleep_with_cancellation(&CancelToken::never(), duration)
            .await;
    }

    /// Suspend until the clock has moved `duration` past the current time,
    /// or until `cancel` is triggered
    ///
    /// When the cancellation and the wake are both ready, cancellation wins
    /// and the wake is discarded. Dropping the returned future before it
    /// completes deregisters the sleeper as well.
    ///
    /// Durations of zero or less return `Ok(())` without parking.
    pub async fn sleep_with_cancellation(
        &self,
        cancel: &CancelToken,
        duration: Duration,
    ) -> ClockResult<()> {
        let ticket = self.enter_sleep(duration);
        self.finish_sleep(ticket, cancel).await
    }

    /// Start a timer that delivers the current time once `duration` has passed
    ///
    /// Must be called from within a tokio runtime.
    pub fn new_timer(self: &Arc<Self>, duration: Duration) -> Timer {
        Timer::start(Arc::clone(self), duration)
    }

    /// Number of sleepers currently parked
    pub fn pending_waiters(&self) -> usize {
        self.waiters.len()
    }

    /// Number of sleep calls made since creation, parked or not
    pub fn total_sleeps(&self) -> u64 {
        self.total_sleeps.load(Ordering::Relaxed)
    }

    /// Earliest deadline among parked sleepers
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.waiters.next_deadline()
    }

    /// Wait until at least `target` sleepers are parked
    ///
    /// Lets a test driver synchronize with sleepers on other tasks without
    /// polling in real time.
    pub async fn wait_for_pending(&self, target: usize) {
        self.waiters.wait_for_len(target).await
    }

    /// Count the sleep and park it unless its deadline has already been reached
    ///
    /// The returned ticket owns the registration: dropping it, awaited or
    /// not, deregisters the sleeper.
    pub(crate) fn enter_sleep(&self, duration: Duration) -> SleepTicket {
        self.total_sleeps.fetch_add(1, Ordering::Relaxed);

        // Hold the read lock across insertion: a concurrent forward either
        // scans after this waiter exists or moved time before the deadline
        // was computed
        let now = self.current.read();
        let deadline = saturating_add(*now, duration.max(Duration::zero()));
        let parked = (deadline > *now).then(|| {
            let (id, wake) = self.waiters.register(deadline);
            Parked {
                registry: Arc::clone(&self.waiters),
                id,
                wake,
            }
        });

        SleepTicket { deadline, parked }
    }

    /// Wait out a ticket from [`ManualClock::enter_sleep`], or until `cancel`
    pub(crate) async fn finish_sleep(
        &self,
        mut ticket: SleepTicket,
        cancel: &CancelToken,
    ) -> ClockResult<()> {
        let Some(parked) = ticket.parked.as_mut() else {
            return Ok(());
        };
        let id = parked.id;

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                if self.waiters.remove(id) {
                    debug!("[{}] Cancelled {}", self.name, id);
                } else {
                    debug!("[{}] Cancelled {} after it fired", self.name, id);
                }
                Err(ClockError::Cancelled)
            }
            // The sender is only dropped unfired by our own removal
            _ = &mut parked.wake => Ok(()),
        }
    }

    /// Remove a parked sleeper without waking it
    ///
    /// Returns `false` if it already fired or was already removed.
    pub(crate) fn deregister(&self, id: WaiterId) -> bool {
        self.waiters.remove(id)
    }
}

/// A sleep that has been counted and, if still in the future, parked
#[derive(Debug)]
pub(crate) struct SleepTicket {
    pub(crate) deadline: Timestamp,
    parked: Option<Parked>,
}

impl SleepTicket {
    /// Id of the parked sleeper, `None` if the deadline was already reached
    pub(crate) fn waiter(&self) -> Option<WaiterId> {
        self.parked.as_ref().map(|parked| parked.id)
    }

    /// Wait for the wake signal alone
    ///
    /// Returns `true` when the sleeper fired (or never had to park) and
    /// `false` when it was deregistered before firing.
    pub(crate) async fn fired(&mut self) -> bool {
        match self.parked.as_mut() {
            Some(parked) => (&mut parked.wake).await.is_ok(),
            None => true,
        }
    }
}

/// Registry entry held by a ticket; deregisters when dropped
#[derive(Debug)]
struct Parked {
    registry: Arc<WaiterRegistry>,
    id: WaiterId,
    wake: oneshot::Receiver<()>,
}

impl Drop for Parked {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            debug!("Sleep dropped before waking, deregistered {}", self.id);
        }
    }
}

fn saturating_add(time: Timestamp, duration: Duration) -> Timestamp {
    time.checked_add_signed(duration).unwrap_or_else(|| {
        warn!("{} + {} overflows, saturating", time, duration);
        DateTime::<Utc>::MAX_UTC
    })
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        ManualClock::now(self)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ControllableClock for ManualClock {
    fn forward(&self, duration: Duration) -> usize {
        ManualClock::forward(self, duration)
    }
}
