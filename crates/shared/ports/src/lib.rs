//! Crown Ports
//!
//! Port definitions (traits) for the Crown clock.
//! These define the boundary between code that reads time and the
//! clock implementation that drives it.

mod clock;
mod error;

pub use clock::{Clock, ControllableClock};
pub use error::{ClockError, ClockResult};
