// crates/pull-server-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Pull Store
// Description: Durable pull store backend using SQLite WAL.
// Purpose: Persist registrations, configurations, modules, and reports.
// Dependencies: pull-server-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqlitePullStore`], a `SQLite` implementation of every
//! pull store interface. Each mutation is a single transaction, payloads are
//! stored with a SHA-256 content hash, and loads fail closed when the stored
//! hash no longer matches. Security posture: database contents are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_PAYLOAD_BYTES;
pub use store::SqlitePullStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
