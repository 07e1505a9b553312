// crates/pull-server-cli/src/lib.rs
// ============================================================================
// Module: Pull Server CLI Library
// Description: Shared wiring for the pull-server binary and its tests.
// Purpose: Expose the bootstrap that turns configuration into a handler.
// Dependencies: crate::bootstrap
// ============================================================================

//! ## Overview
//! The `pull-server` binary (`src/main.rs`) and integration tests share the
//! bootstrap defined here. Security posture: configuration and provider
//! manifests are untrusted inputs and are validated before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Configuration to handler wiring.
pub mod bootstrap;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::BootstrapError;
pub use bootstrap::ChecksumRegistry;
pub use bootstrap::PullServer;
