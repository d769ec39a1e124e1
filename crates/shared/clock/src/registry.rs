use crown_core::{Timestamp, WaiterId};
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Notify, oneshot};

/// One parked sleeper
///
/// Owning the `wake` sender is what entitles a path to fire the waiter.
/// Whoever removes the record from the map owns it, so a record can be
/// fired or cancelled but never both.
#[derive(Debug)]
struct Waiter {
    deadline: Timestamp,
    wake: oneshot::Sender<()>,
}

/// Concurrent registry of pending sleepers, keyed by [`WaiterId`]
///
/// The map is sharded, so registrations and removals on different waiters
/// do not contend on a single lock. The registry also carries the wake pass
/// ([`WaiterRegistry::resolve_due`]) run after every time change.
#[derive(Debug, Default)]
pub struct WaiterRegistry {
    waiters: DashMap<WaiterId, Waiter>,
    next_id: AtomicU64,
    /// Notified on every insert and removal
    changed: Notify,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a new waiter due at `deadline`
    ///
    /// Returns the allocated id and the receiving half of its one-shot wake
    /// signal.
    pub fn register(&self, deadline: Timestamp) -> (WaiterId, oneshot::Receiver<()>) {
        let id = WaiterId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (wake, rx) = oneshot::channel();

        self.waiters.insert(id, Waiter { deadline, wake });
        debug!("Registered {} due at {}", id, deadline);

        self.changed.notify_waiters();
        (id, rx)
    }

    /// Fire and remove every waiter whose deadline is at or before `now`
    ///
    /// Returns the number of waiters fired. No order is guaranteed among
    /// waiters that become due in the same pass.
    pub fn resolve_due(&self, now: Timestamp) -> usize {
        // Collect first: removing while iterating would deadlock on the shard lock
        let due: Vec<WaiterId> = self
            .waiters
            .iter()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| *entry.key())
            .collect();

        let mut fired = 0;
        for id in due {
            // A concurrent cancellation may have taken the record already
            if let Some((_, waiter)) = self.waiters.remove(&id) {
                // The receiver may be gone if its sleep future was dropped mid-flight
                if waiter.wake.send(()).is_ok() {
                    debug!("Fired {} (deadline {})", id, waiter.deadline);
                }
                fired += 1;
            }
        }

        if fired > 0 {
            self.changed.notify_waiters();
        }
        fired
    }

    /// Remove a waiter without firing it
    ///
    /// Returns whether the waiter was still registered. Calling it for an id
    /// that already fired or was already removed is a no-op returning `false`.
    pub fn remove(&self, id: WaiterId) -> bool {
        let removed = self.waiters.remove(&id).is_some();
        if removed {
            self.changed.notify_waiters();
        }
        removed
    }

    /// Whether `id` is still parked
    pub fn contains(&self, id: WaiterId) -> bool {
        self.waiters.contains_key(&id)
    }

    /// Number of waiters currently parked
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Earliest deadline among parked waiters
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.waiters.iter().map(|entry| entry.deadline).min()
    }

    /// Wait until at least `target` waiters are parked
    pub async fn wait_for_len(&self, target: usize) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register interest before checking, otherwise a change landing
            // between the check and the await would be lost
            notified.as_mut().enable();

            if self.len() >= target {
                return;
            }
            notified.await;
        }
    }
}
