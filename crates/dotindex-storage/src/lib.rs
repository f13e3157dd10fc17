//! dotindex-storage — durable ledger backend for DotIndex.
//!
//! The in-memory store for tests and dev lives next to the trait in
//! `dotindex-core`; this crate provides the persistent SQLite backend.

pub mod sqlite;

pub use sqlite::SqliteLedgerStore;
