//! Utility modules
//!
//! This module contains common utilities used throughout the engine,
//! including error handling, logging setup, clocks and helper functions.

pub mod clock;
pub mod errors;
pub mod logging;
pub mod helpers;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{ErrorSeverity, LotteryError, Result};
