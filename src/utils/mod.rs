//! General-purpose utility modules.

pub mod error;
pub mod log;
pub mod parallel;

// Re-export commonly used items
pub use error::{Result, SpotError};
