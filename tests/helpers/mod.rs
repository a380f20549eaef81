//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory service context,
//! fixtures, a mock push function and a Postgres container helper.

#![allow(dead_code)]

pub mod push_mock;
pub mod database_helper;
pub mod test_context;
pub mod simple_test;
pub mod test_data;

pub use push_mock::*;
pub use database_helper::*;
pub use test_context::*;
pub use simple_test::*;
pub use test_data::*;
