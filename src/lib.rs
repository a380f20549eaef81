//! EventLottery
//!
//! Waitlist lifecycle and lottery selection engine for event registration.
//! Entrants join an event's waitlist, organizers draw winners at random,
//! winners accept or decline, and every status bucket can be notified.
//! Storage and push delivery sit behind traits so the engine runs on
//! Postgres or entirely in memory.

#![allow(non_snake_case)]

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{LotteryError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, InMemoryStore};
pub use services::{Backends, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
