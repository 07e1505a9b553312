// crates/pull-server-config/src/config.rs
// ============================================================================
// Module: Pull Server Configuration
// Description: Configuration loading and validation for the pull server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: pull-server-core, pull-server-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then the `PULL_SERVER_CONFIG` environment
//! variable, then `pull-server.toml` in the working directory. Missing or
//! invalid configuration fails closed.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use pull_server_core::AuthzMode;
use pull_server_core::ChecksumSettings;
use pull_server_core::DEFAULT_CHECKSUM_ALGORITHM;
use pull_server_core::HandlerConfig;
use pull_server_core::ParameterMap;
use pull_server_core::runtime::DEFAULT_MAX_REPORT_BYTES;
use pull_server_core::runtime::DEFAULT_REFRESH_INTERVAL_MINUTES;
use pull_server_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "pull-server.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PULL_SERVER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of provider search paths.
pub(crate) const MAX_SEARCH_PATHS: usize = 64;
/// Maximum number of checksum parameters.
pub(crate) const MAX_CHECKSUM_PARAMETERS: usize = 64;
/// Maximum length of a provider or parameter name.
pub(crate) const MAX_NAME_LENGTH: usize = 128;
/// Maximum authorization key refresh interval (one day).
pub(crate) const MAX_REFRESH_INTERVAL_MINUTES: u64 = 24 * 60;
/// Maximum accepted report size in bytes.
pub(crate) const MAX_REPORT_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Pull server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullServerConfig {
    /// Serve-time checksum selection.
    #[serde(default)]
    pub checksum: ChecksumConfig,
    /// Provider registry inputs.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Registration key authorization.
    #[serde(default)]
    pub authz: AuthzConfig,
    /// Store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Handler behavior.
    #[serde(default)]
    pub handler: HandlerSection,
    /// Event sink selection.
    #[serde(default)]
    pub events: EventsConfig,
    /// Resolved path the config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl PullServerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.checksum.validate()?;
        self.providers.validate()?;
        self.authz.validate()?;
        self.store.validate()?;
        self.handler.validate()?;
        self.events.validate()?;
        Ok(())
    }

    /// Returns the directory holding the config file, if loaded from disk.
    #[must_use]
    pub fn config_dir(&self) -> Option<&Path> {
        self.source_path.as_deref().and_then(Path::parent)
    }

    /// Returns the handler settings this config describes.
    #[must_use]
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            checksum: self.checksum.settings(),
            max_report_bytes: self.handler.max_report_bytes,
            require_registration_key: self.authz.require_registration_key,
        }
    }
}

// ============================================================================
// SECTION: Checksum
// ============================================================================

/// Serve-time checksum configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChecksumConfig {
    /// Provider name used for configuration and module checksums.
    #[serde(default = "default_checksum_algorithm")]
    pub default_algorithm: String,
    /// Parameters applied to the provider before producing.
    #[serde(default)]
    pub parameters: ParameterMap,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            default_algorithm: default_checksum_algorithm(),
            parameters: ParameterMap::new(),
        }
    }
}

impl ChecksumConfig {
    /// Returns the checksum settings handed to the handler.
    #[must_use]
    pub fn settings(&self) -> ChecksumSettings {
        ChecksumSettings {
            algorithm: self.default_algorithm.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Validates checksum configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("checksum.default_algorithm", &self.default_algorithm)?;
        if self.parameters.len() > MAX_CHECKSUM_PARAMETERS {
            return Err(ConfigError::Invalid(format!(
                "checksum.parameters exceeds {MAX_CHECKSUM_PARAMETERS} entries"
            )));
        }
        for name in self.parameters.keys() {
            validate_name("checksum.parameters", name)?;
        }
        Ok(())
    }
}

/// Returns the default checksum provider name.
fn default_checksum_algorithm() -> String {
    DEFAULT_CHECKSUM_ALGORITHM.to_string()
}

// ============================================================================
// SECTION: Providers
// ============================================================================

/// Provider registry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProvidersConfig {
    /// Optional subset of the capability table to expose as built-ins.
    #[serde(default)]
    pub builtins: Option<Vec<String>>,
    /// Extra locations scanned for provider manifests.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Discovered providers replace built-ins.
    #[serde(default)]
    pub replace_builtins: bool,
    /// Configured search paths replace the default location.
    #[serde(default)]
    pub replace_search_paths: bool,
}

impl ProvidersConfig {
    /// Validates provider configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(builtins) = &self.builtins {
            let mut seen = BTreeSet::new();
            for name in builtins {
                validate_name("providers.builtins", name)?;
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "providers.builtins contains duplicate entry: {name}"
                    )));
                }
            }
        }
        if self.search_paths.len() > MAX_SEARCH_PATHS {
            return Err(ConfigError::Invalid(format!(
                "providers.search_paths exceeds {MAX_SEARCH_PATHS} entries"
            )));
        }
        for path in &self.search_paths {
            validate_path_string("providers.search_paths", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Registration key authorization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthzConfig {
    /// Key refresh interval in minutes; 0 disables authorization.
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,
    /// File listing authorized registration keys, one per line. Without it
    /// the authorized set is empty and keyed registration is refused.
    #[serde(default)]
    pub keys_path: Option<PathBuf>,
    /// Require an authorized key on registration while authorization is enabled.
    #[serde(default = "default_true")]
    pub require_registration_key: bool,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: default_refresh_interval_minutes(),
            keys_path: None,
            require_registration_key: true,
        }
    }
}

impl AuthzConfig {
    /// Returns the key cache mode.
    #[must_use]
    pub const fn mode(&self) -> AuthzMode {
        AuthzMode::from_interval_minutes(self.refresh_interval_minutes)
    }

    /// Validates authorization configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_minutes > MAX_REFRESH_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "authz.refresh_interval_minutes must be at most {MAX_REFRESH_INTERVAL_MINUTES}"
            )));
        }
        if let Some(path) = &self.keys_path {
            validate_path_string("authz.keys_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Returns the default key refresh interval.
const fn default_refresh_interval_minutes() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

/// Returns true.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Store backend type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// In-memory store (lost on exit).
    #[default]
    Memory,
    /// `SQLite` store.
    Sqlite,
}

/// Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` settings when using the sqlite backend.
    #[serde(default)]
    pub sqlite: Option<SqliteStoreConfig>,
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.store_type, &self.sqlite) {
            (StoreType::Memory, None) => Ok(()),
            (StoreType::Memory, Some(_)) => {
                Err(ConfigError::Invalid("memory store must not set store.sqlite".to_string()))
            }
            (StoreType::Sqlite, None) => {
                Err(ConfigError::Invalid("sqlite store requires store.sqlite.path".to_string()))
            }
            (StoreType::Sqlite, Some(sqlite)) => {
                validate_path_string("store.sqlite.path", &sqlite.path.to_string_lossy())?;
                if sqlite.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.sqlite.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Action dispatch backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionDispatchMode {
    /// Compare client checksums against server checksums.
    #[default]
    Checksum,
    /// No dispatcher; get-action reports not implemented.
    None,
}

/// Handler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandlerSection {
    /// Action dispatch backend.
    #[serde(default)]
    pub action_dispatch: ActionDispatchMode,
    /// Maximum serialized report size in bytes.
    #[serde(default = "default_max_report_bytes")]
    pub max_report_bytes: usize,
}

impl Default for HandlerSection {
    fn default() -> Self {
        Self {
            action_dispatch: ActionDispatchMode::default(),
            max_report_bytes: default_max_report_bytes(),
        }
    }
}

impl HandlerSection {
    /// Validates handler configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_report_bytes == 0 || self.max_report_bytes > MAX_REPORT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "handler.max_report_bytes must be between 1 and {MAX_REPORT_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Returns the default report size limit.
const fn default_max_report_bytes() -> usize {
    DEFAULT_MAX_REPORT_BYTES
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Event sink type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Event sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: EventSinkType,
    /// Output path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EventsConfig {
    /// Validates event sink configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (EventSinkType::File, Some(path)) => {
                validate_path_string("events.path", &path.to_string_lossy())
            }
            (EventSinkType::File, None) => {
                Err(ConfigError::Invalid("events.sink=file requires events.path".to_string()))
            }
            (EventSinkType::Stderr | EventSinkType::None, Some(_)) => Err(ConfigError::Invalid(
                "events.path is only valid with events.sink=file".to_string(),
            )),
            (EventSinkType::Stderr | EventSinkType::None, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a provider or parameter name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() || value.trim() != value {
        return Err(ConfigError::Invalid(format!(
            "{field} entries must be non-empty without surrounding whitespace"
        )));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} entry exceeds {MAX_NAME_LENGTH} bytes")));
    }
    Ok(())
}
