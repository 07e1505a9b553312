// crates/pull-server-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the operator CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `pull-server.toml`. The example is kept valid: tests
//! parse and validate it.

/// Returns a canonical example `pull-server.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[checksum]
default_algorithm = "SHA-256"

[checksum.parameters]
chunk_size = "65536"

[providers]
builtins = ["SHA-256", "SHA-512"]
search_paths = ["/etc/pull-server/providers"]
replace_builtins = false
replace_search_paths = false

[authz]
refresh_interval_minutes = 15
keys_path = "/etc/pull-server/authz-keys"
require_registration_key = true

[store]
type = "sqlite"

[store.sqlite]
path = "/var/lib/pull-server/pull.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[handler]
action_dispatch = "checksum"
max_report_bytes = 1048576

[events]
sink = "file"
path = "/var/log/pull-server/events.jsonl"
"#,
    )
}
