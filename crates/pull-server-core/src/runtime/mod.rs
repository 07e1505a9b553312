// crates/pull-server-core/src/runtime/mod.rs
// ============================================================================
// Module: Pull Server Runtime
// Description: Pull handler, key cache, checksum service, stores, and events.
// Purpose: Execute the pull protocol against injected stores and providers.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules implement the pull protocol handler and the collaborators
//! it is constructed with. Every transport must call into the same handler to
//! preserve the protocol rules.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod actions;
pub mod authz;
pub mod checksum;
pub mod events;
pub mod handler;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actions::ActionContext;
pub use actions::ActionDispatcher;
pub use actions::ChecksumActionDispatcher;
pub use authz::AuthzKeyCache;
pub use authz::AuthzKeySnapshot;
pub use authz::AuthzMode;
pub use authz::DEFAULT_REFRESH_INTERVAL_MINUTES;
pub use authz::FileKeySource;
pub use authz::StaticKeySource;
pub use checksum::ChecksumService;
pub use events::EventOutcome;
pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::PullEvent;
pub use events::PullEventSink;
pub use events::StderrEventSink;
pub use handler::DEFAULT_MAX_REPORT_BYTES;
pub use handler::HandlerConfig;
pub use handler::HandlerError;
pub use handler::PullHandler;
pub use store::InMemoryPullStore;
