//! Storage module
//!
//! Persistence for pasteboard history and watcher settings

pub mod database;

pub use database::{Database, DatabaseError};
