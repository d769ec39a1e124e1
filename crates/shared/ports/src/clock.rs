use crown_core::{Duration, Timestamp};

/// Port for time abstraction
///
/// Code under test reads time through this trait so a manual clock can be
/// swapped in without touching the caller.
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}

/// A clock whose time only moves when a driver moves it
pub trait ControllableClock: Clock {
    /// Move time forward by `duration` and wake every sleeper that became due.
    ///
    /// Returns the number of sleepers woken by this call.
    fn forward(&self, duration: Duration) -> usize;
}
