// crates/pull-server-cli/tests/common/mod.rs
// ============================================================================
// Module: Common CLI Test Fixtures
// Description: Shared config and key file fixtures for CLI tests.
// Purpose: Write throwaway pull-server.toml files into temp directories.
// Dependencies: tempfile
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Config body with events discarded and everything else defaulted.
pub const QUIET: &str = "[events]\nsink = \"none\"\n";

/// Writes `pull-server.toml` into `dir` and returns its path.
pub fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("pull-server.toml");
    fs::write(&path, body).expect("write config");
    path
}

/// Writes a key file with one key per line and returns its path.
pub fn write_keys(dir: &Path, keys: &[&str]) -> PathBuf {
    let path = dir.join("authz-keys");
    fs::write(&path, format!("# registration keys\n{}\n", keys.join("\n"))).expect("write keys");
    path
}

/// Config body reading keys from `keys` with events discarded.
pub fn keyed_config(keys: &Path) -> String {
    format!("{QUIET}[authz]\nkeys_path = '{}'\n", keys.display())
}

/// Writes a provider manifest into `<dir>/providers.d`.
pub fn write_manifest(dir: &Path, name: &str, implementation: &str) -> PathBuf {
    let providers = dir.join("providers.d");
    fs::create_dir_all(&providers).expect("create providers.d");
    let path = providers.join(format!("{name}.toml"));
    fs::write(
        &path,
        format!(
            "name = \"{name}\"\nlabel = \"{name} digest\"\nimplementation = \"{implementation}\"\n"
        ),
    )
    .expect("write manifest");
    path
}
