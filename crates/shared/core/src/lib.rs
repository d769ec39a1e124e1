//! Crown Core
//!
//! Pure value types shared by the Crown clock crates.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod values;

// Re-export commonly used types at crate root
pub use values::{Duration, Timestamp, WaiterId};
