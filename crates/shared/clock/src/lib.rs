//! Crown Clock
//!
//! A logical clock for testing time-dependent concurrent code without
//! real delays. Time only moves when a driver forwards it; sleepers park
//! against the clock and are woken exactly once when their deadline is
//! reached.
//!
//! ## Structure
//!
//! ```text
//! ManualClock
//!     │
//!     ├── current time (RwLock, mutated only by forward)
//!     │
//!     └── WaiterRegistry (sharded map: WaiterId -> deadline + one-shot wake)
//!             ▲                         │
//!             │ register / remove       │ resolve_due (on every forward)
//!             │                         ▼
//!         sleep / sleep_with_cancellation / Timer
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crown_clock::{CancelToken, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(start);
//!
//! let sleeper = {
//!     let clock = clock.clone();
//!     tokio::spawn(async move { clock.sleep(Duration::seconds(4)).await })
//! };
//!
//! clock.wait_for_pending(1).await; // sleeper is parked
//! clock.forward(Duration::seconds(4)); // and now woken
//! sleeper.await?;
//!
//! let timer = clock.new_timer(Duration::seconds(42));
//! timer.stop(); // nothing will be delivered
//! ```

mod cancel;
mod config;
mod manual;
mod registry;
mod timer;

pub use cancel::CancelToken;
pub use config::{ClockConfig, ConfigError};
pub use manual::ManualClock;
pub use registry::WaiterRegistry;
pub use timer::Timer;

// Re-export the ports and value types for convenience
pub use crown_core::{Duration, Timestamp, WaiterId};
pub use crown_ports::{Clock, ClockError, ClockResult, ControllableClock};
