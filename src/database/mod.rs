//! Database module
//!
//! This module handles storage traits, the Postgres backend and the
//! in-memory backend

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use memory::InMemoryStore;
pub use repositories::{BanRepository, EventRepository, EntrantRepository, NotificationRepository, TagRepository};
pub use service::DatabaseService;
pub use store::{BanList, CasOutcome, InsertOutcome, LotteryStore, NotificationLog, TagStore};
