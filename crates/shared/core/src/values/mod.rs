use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical point in time, in UTC
pub type Timestamp = DateTime<Utc>;

/// Signed span of logical time
pub type Duration = chrono::Duration;

/// Identifier of a parked sleeper
///
/// Allocated from a strictly increasing per-clock counter, so a larger id
/// always means a later registration on the same clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaiterId(u64);

impl WaiterId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for WaiterId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waiter#{}", self.0)
    }
}
