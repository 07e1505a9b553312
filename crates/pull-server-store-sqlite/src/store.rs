// crates/pull-server-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Pull Store
// Description: Durable pull store backed by SQLite WAL.
// Purpose: Persist pull-protocol state with single-transaction mutations.
// Dependencies: pull-server-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Persisted layout:
//! - `registrations` keyed by agent id
//! - `configurations` keyed by (agent id, name)
//! - `modules` keyed by (name, version)
//! - `reports` keyed by (agent id, sequence), with a job id column
//!
//! Every payload is stored next to its SHA-256 hash. Loads recompute the
//! hash and fail closed with [`SqliteStoreError::Corrupt`] on mismatch.
//! Create-once tables use `INSERT OR IGNORE` and treat an unchanged row count
//! as a conflict, so concurrent creators see exactly one success. Report
//! sequences are assigned inside the inserting transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use pull_server_core::AgentId;
use pull_server_core::AgentRegistration;
use pull_server_core::Configuration;
use pull_server_core::ConfigurationName;
use pull_server_core::ConfigurationStore;
use pull_server_core::Module;
use pull_server_core::ModuleName;
use pull_server_core::ModuleStore;
use pull_server_core::ModuleVersion;
use pull_server_core::RegistrationStore;
use pull_server_core::Report;
use pull_server_core::ReportEntry;
use pull_server_core::ReportStore;
use pull_server_core::StoreError;
use pull_server_core::Timestamp;
use pull_server_core::hashing::sha256_hex;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum payload size accepted or returned by the store.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;
/// [`MAX_PAYLOAD_BYTES`] as an SQL parameter.
const MAX_PAYLOAD_BYTES_SQL: i64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` pull store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default modes for a database path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Create-once record already exists.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Payload exceeded the store size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "payload exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps an engine error.
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed pull store with WAL support.
#[derive(Clone)]
pub struct SqlitePullStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePullStore {
    /// Opens an `SQLite`-backed pull store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or carries an unsupported schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Inserts a registration unless one exists.
    fn insert_registration(&self, registration: &AgentRegistration) -> Result<(), SqliteStoreError> {
        let payload = serde_json::to_vec(registration)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        check_size(payload.len())?;
        let hash = sha256_hex(&payload);
        let agent_id = registration.agent_id.to_string();
        let guard = self.lock()?;
        let inserted = guard
            .execute(
                "INSERT OR IGNORE INTO registrations (agent_id, registration_json, \
                 registration_hash, registered_at) VALUES (?1, ?2, ?3, ?4)",
                params![agent_id, payload, hash, registration.registered_at.unix_millis()],
            )
            .map_err(db_error)?;
        drop(guard);
        if inserted == 0 {
            return Err(SqliteStoreError::Conflict(format!("agent {agent_id} already registered")));
        }
        Ok(())
    }

    /// Loads and verifies a registration.
    fn select_registration(
        &self,
        agent_id: &AgentId,
    ) -> Result<Option<AgentRegistration>, SqliteStoreError> {
        let key = agent_id.to_string();
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT length(registration_json), registration_hash, CASE WHEN \
                 length(registration_json) <= ?2 THEN registration_json END FROM registrations \
                 WHERE agent_id = ?1",
                params![key, MAX_PAYLOAD_BYTES_SQL],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<Vec<u8>>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        let Some((length, hash, payload)) = row else {
            return Ok(None);
        };
        let payload = verified_payload(&format!("registration {key}"), length, &hash, payload)?;
        let registration: AgentRegistration = serde_json::from_slice(&payload)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if registration.agent_id != *agent_id {
            return Err(SqliteStoreError::Invalid(
                "agent_id mismatch between key and registration payload".to_string(),
            ));
        }
        Ok(Some(registration))
    }

    /// Inserts or replaces a configuration.
    fn upsert_configuration(&self, configuration: &Configuration) -> Result<(), SqliteStoreError> {
        check_size(configuration.content.len())?;
        let hash = sha256_hex(&configuration.content);
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO configurations (agent_id, name, content, content_hash, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(agent_id, name) DO UPDATE SET content \
                 = excluded.content, content_hash = excluded.content_hash, updated_at = \
                 excluded.updated_at",
                params![
                    configuration.agent_id.to_string(),
                    configuration.name.as_str(),
                    configuration.content,
                    hash,
                    Timestamp::now().unix_millis()
                ],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Loads and verifies a configuration.
    fn select_configuration(
        &self,
        agent_id: &AgentId,
        name: &ConfigurationName,
    ) -> Result<Option<Configuration>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT length(content), content_hash, CASE WHEN length(content) <= ?3 THEN \
                 content END FROM configurations WHERE agent_id = ?1 AND name = ?2",
                params![agent_id.to_string(), name.as_str(), MAX_PAYLOAD_BYTES_SQL],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<Vec<u8>>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        let Some((length, hash, content)) = row else {
            return Ok(None);
        };
        let content =
            verified_payload(&format!("configuration {agent_id}/{name}"), length, &hash, content)?;
        Ok(Some(Configuration {
            agent_id: *agent_id,
            name: name.clone(),
            content,
        }))
    }

    /// Lists configuration names for an agent.
    fn select_configuration_names(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<ConfigurationName>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT name FROM configurations WHERE agent_id = ?1 ORDER BY name")
            .map_err(db_error)?;
        let names = statement
            .query_map(params![agent_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .map(|name| name.map(ConfigurationName::new).map_err(db_error))
            .collect::<Result<Vec<_>, _>>()?;
        drop(statement);
        drop(guard);
        Ok(names)
    }

    /// Inserts a module unless the (name, version) exists.
    fn insert_module(&self, module: &Module) -> Result<(), SqliteStoreError> {
        check_size(module.content.len())?;
        let hash = sha256_hex(&module.content);
        let guard = self.lock()?;
        let inserted = guard
            .execute(
                "INSERT OR IGNORE INTO modules (name, version, content, content_hash, \
                 published_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    module.name.as_str(),
                    module.version.as_str(),
                    module.content,
                    hash,
                    Timestamp::now().unix_millis()
                ],
            )
            .map_err(db_error)?;
        drop(guard);
        if inserted == 0 {
            return Err(SqliteStoreError::Conflict(format!(
                "module {} {} already published",
                module.name, module.version
            )));
        }
        Ok(())
    }

    /// Loads and verifies a module.
    fn select_module(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<Option<Module>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT length(content), content_hash, CASE WHEN length(content) <= ?3 THEN \
                 content END FROM modules WHERE name = ?1 AND version = ?2",
                params![name.as_str(), version.as_str(), MAX_PAYLOAD_BYTES_SQL],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<Vec<u8>>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        let Some((length, hash, content)) = row else {
            return Ok(None);
        };
        let content = verified_payload(&format!("module {name} {version}"), length, &hash, content)?;
        Ok(Some(Module {
            name: name.clone(),
            version: version.clone(),
            content,
        }))
    }

    /// Appends a report, assigning the next sequence in one transaction.
    fn insert_report(&self, entry: ReportEntry) -> Result<Report, SqliteStoreError> {
        let payload =
            serde_json::to_vec(&entry).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        check_size(payload.len())?;
        let hash = sha256_hex(&payload);
        let agent_id = entry.agent_id.to_string();
        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
        let last: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(sequence), 0) FROM reports WHERE agent_id = ?1",
                params![agent_id],
                |row| row.get(0),
            )
            .map_err(db_error)?;
        let next = last.checked_add(1).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("report sequence overflow for agent {agent_id}"))
        })?;
        tx.execute(
            "INSERT INTO reports (agent_id, sequence, job_id, report_json, report_hash, \
             received_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                agent_id,
                next,
                entry.job_id.to_string(),
                payload,
                hash,
                entry.received_at.unix_millis()
            ],
        )
        .map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(Report::new(sequence_from_sql(next)?, entry))
    }

    /// Lists and verifies reports for an agent in sequence order.
    fn select_reports(&self, agent_id: &AgentId) -> Result<Vec<Report>, SqliteStoreError> {
        let rows = {
            let guard = self.lock()?;
            let mut statement = guard
                .prepare(
                    "SELECT sequence, length(report_json), report_hash, CASE WHEN \
                     length(report_json) <= ?2 THEN report_json END FROM reports WHERE agent_id \
                     = ?1 ORDER BY sequence",
                )
                .map_err(db_error)?;
            let rows = statement
                .query_map(params![agent_id.to_string(), MAX_PAYLOAD_BYTES_SQL], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<Vec<u8>>>(3)?,
                    ))
                })
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            drop(statement);
            drop(guard);
            rows
        };
        rows.into_iter()
            .map(|(sequence, length, hash, payload)| {
                let label = format!("report {agent_id}#{sequence}");
                let payload = verified_payload(&label, length, &hash, payload)?;
                let entry: ReportEntry = serde_json::from_slice(&payload)
                    .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
                if entry.agent_id != *agent_id {
                    return Err(SqliteStoreError::Invalid(format!(
                        "agent_id mismatch between key and payload for {label}"
                    )));
                }
                Ok(Report::new(sequence_from_sql(sequence)?, entry))
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Store Interfaces
// ============================================================================

impl RegistrationStore for SqlitePullStore {
    fn create_registration(&self, registration: &AgentRegistration) -> Result<(), StoreError> {
        self.insert_registration(registration).map_err(StoreError::from)
    }

    fn load_registration(&self, agent_id: &AgentId) -> Result<Option<AgentRegistration>, StoreError> {
        self.select_registration(agent_id).map_err(StoreError::from)
    }
}

impl ConfigurationStore for SqlitePullStore {
    fn put_configuration(&self, configuration: &Configuration) -> Result<(), StoreError> {
        self.upsert_configuration(configuration).map_err(StoreError::from)
    }

    fn load_configuration(
        &self,
        agent_id: &AgentId,
        name: &ConfigurationName,
    ) -> Result<Option<Configuration>, StoreError> {
        self.select_configuration(agent_id, name).map_err(StoreError::from)
    }

    fn list_configurations(&self, agent_id: &AgentId) -> Result<Vec<ConfigurationName>, StoreError> {
        self.select_configuration_names(agent_id).map_err(StoreError::from)
    }
}

impl ModuleStore for SqlitePullStore {
    fn publish_module(&self, module: &Module) -> Result<(), StoreError> {
        self.insert_module(module).map_err(StoreError::from)
    }

    fn load_module(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<Option<Module>, StoreError> {
        self.select_module(name, version).map_err(StoreError::from)
    }
}

impl ReportStore for SqlitePullStore {
    fn append_report(&self, entry: ReportEntry) -> Result<Report, StoreError> {
        self.insert_report(entry).map_err(StoreError::from)
    }

    fn list_reports(&self, agent_id: &AgentId) -> Result<Vec<Report>, StoreError> {
        self.select_reports(agent_id).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects payloads larger than [`MAX_PAYLOAD_BYTES`].
fn check_size(actual_bytes: usize) -> Result<(), SqliteStoreError> {
    if actual_bytes > MAX_PAYLOAD_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_PAYLOAD_BYTES,
            actual_bytes,
        });
    }
    Ok(())
}

/// Checks a stored payload's size and hash, returning its bytes.
fn verified_payload(
    label: &str,
    length: i64,
    stored_hash: &str,
    payload: Option<Vec<u8>>,
) -> Result<Vec<u8>, SqliteStoreError> {
    let length = usize::try_from(length)
        .map_err(|_| SqliteStoreError::Invalid(format!("negative payload length for {label}")))?;
    check_size(length)?;
    let payload =
        payload.ok_or_else(|| SqliteStoreError::Corrupt(format!("missing payload for {label}")))?;
    if sha256_hex(&payload) != stored_hash {
        return Err(SqliteStoreError::Corrupt(format!("hash mismatch for {label}")));
    }
    Ok(payload)
}

/// Converts a stored sequence to its protocol form.
fn sequence_from_sql(sequence: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(sequence)
        .ok()
        .filter(|sequence| *sequence > 0)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid report sequence {sequence}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS registrations (
                    agent_id TEXT PRIMARY KEY,
                    registration_json BLOB NOT NULL,
                    registration_hash TEXT NOT NULL,
                    registered_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS configurations (
                    agent_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    content BLOB NOT NULL,
                    content_hash TEXT NOT NULL,
                    updated_at INTEGER NOT NULL,
                    PRIMARY KEY (agent_id, name)
                );
                CREATE TABLE IF NOT EXISTS modules (
                    name TEXT NOT NULL,
                    version TEXT NOT NULL,
                    content BLOB NOT NULL,
                    content_hash TEXT NOT NULL,
                    published_at INTEGER NOT NULL,
                    PRIMARY KEY (name, version)
                );
                CREATE TABLE IF NOT EXISTS reports (
                    agent_id TEXT NOT NULL,
                    sequence INTEGER NOT NULL,
                    job_id TEXT NOT NULL,
                    report_json BLOB NOT NULL,
                    report_hash TEXT NOT NULL,
                    received_at INTEGER NOT NULL,
                    PRIMARY KEY (agent_id, sequence)
                );
                CREATE INDEX IF NOT EXISTS idx_reports_job_id
                    ON reports (agent_id, job_id);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
