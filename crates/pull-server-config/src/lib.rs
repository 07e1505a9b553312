// crates/pull-server-config/src/lib.rs
// ============================================================================
// Module: Pull Server Config Library
// Description: Canonical config model, validation, and examples.
// Purpose: Single source of truth for pull-server.toml semantics.
// Dependencies: pull-server-core, pull-server-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `pull-server-config` defines the configuration model for the pull server.
//! It provides strict, fail-closed validation and a canonical example file.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
