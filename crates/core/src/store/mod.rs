//! SQLite-backed versioned response store.
//!
//! This module provides the persistent key/value store the worker caches
//! responses in, with async access via tokio-rusqlite. It supports:
//!
//! - Named cache generations (one per version tag)
//! - Request-addressed entries using SHA-256 keys
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::{CachedResponse, ResponseKind};
pub use key::request_key;
