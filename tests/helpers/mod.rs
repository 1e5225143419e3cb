//! Test helpers module
//!
//! Utilities shared by the integration tests: an application context over
//! the in-memory store, request builders and a PostgreSQL harness.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
