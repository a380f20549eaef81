//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod event;
pub mod entrant;
pub mod notification;
pub mod tag;
pub mod ban;

// Re-export repositories
pub use event::EventRepository;
pub use entrant::EntrantRepository;
pub use notification::NotificationRepository;
pub use tag::TagRepository;
pub use ban::BanRepository;
