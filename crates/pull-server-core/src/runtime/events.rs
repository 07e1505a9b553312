// crates/pull-server-core/src/runtime/events.rs
// ============================================================================
// Module: Pull Server Events
// Description: Structured operational events and pluggable sinks.
// Purpose: Emit JSON-line events without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every handler operation, registry warning, and key refresh produces a
//! [`PullEvent`]. The sink is injected at construction so deployments can
//! route events to stderr, a file, or nowhere. Secrets never appear in events;
//! keys are reported by fingerprint only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::identifiers::AgentId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Operation completed.
    Success,
    /// Requested record does not exist.
    NotFound,
    /// Create-once record already exists.
    Conflict,
    /// Request rejected by validation or authorization.
    Rejected,
    /// Operation failed unexpectedly.
    Failed,
    /// Non-fatal condition worth surfacing.
    Warning,
}

/// Structured event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation label.
    pub operation: &'static str,
    /// Outcome classification.
    pub outcome: EventOutcome,
    /// Agent identifier when the operation is agent-scoped.
    pub agent_id: Option<AgentId>,
    /// Free-form detail (never secret material).
    pub detail: Option<String>,
}

impl PullEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        event: &'static str,
        operation: &'static str,
        outcome: EventOutcome,
        agent_id: Option<AgentId>,
        detail: Option<String>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            operation,
            outcome,
            agent_id,
            detail,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for structured events.
pub trait PullEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &PullEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl PullEventSink for StderrEventSink {
    fn record(&self, event: &PullEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl PullEventSink for FileEventSink {
    fn record(&self, event: &PullEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards events.
pub struct NoopEventSink;

impl PullEventSink for NoopEventSink {
    fn record(&self, _event: &PullEvent) {}
}

/// Sink that retains events in memory for inspection.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events.
    events: Mutex<Vec<PullEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<PullEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl PullEventSink for MemoryEventSink {
    fn record(&self, event: &PullEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::indexing_slicing,
        reason = "Test-only assertions on a freshly written file."
    )]

    use std::fs;

    use super::EventOutcome;
    use super::FileEventSink;
    use super::PullEvent;
    use super::PullEventSink;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(&PullEvent::new("pull_request", "get_module", EventOutcome::NotFound, None, None));
        sink.record(&PullEvent::new("pull_request", "get_module", EventOutcome::Success, None, None));
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["outcome"], "not_found");
        assert_eq!(first["operation"], "get_module");
    }
}
