// crates/pull-server-core/src/runtime/authz.rs
// ============================================================================
// Module: Authorization Key Cache
// Description: Copy-on-write cache of authorized registration keys.
// Purpose: Answer key checks without blocking on the key backend.
// Dependencies: tokio, crate::interfaces
// ============================================================================

//! ## Overview
//! The cache publishes an immutable [`AuthzKeySnapshot`] behind an
//! `Arc`. Readers clone the pointer under a briefly held read lock and check
//! membership against that one snapshot, so they never see a half-updated
//! key set and never wait on a fetch. A refresh builds a complete new
//! snapshot and swaps the pointer; a failed refresh keeps the last-known-good
//! snapshot.
//!
//! The pointer sits in a `std::sync::RwLock`. The write lock is taken only
//! for the pointer assignment after the fetch has finished, so a reader can
//! wait at most for one `Arc` store and never for key I/O.
//!
//! A refresh interval of zero minutes disables authorization entirely: every
//! key is accepted and no background refresher runs.
//! Security posture: key material is never written to events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::time::Timestamp;
use crate::interfaces::AuthzError;
use crate::interfaces::AuthzKeySource;
use crate::runtime::events::EventOutcome;
use crate::runtime::events::PullEvent;
use crate::runtime::events::PullEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default refresh interval in minutes.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 15;
/// Maximum size of a key file in bytes.
const MAX_KEY_FILE_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Mode
// ============================================================================

/// Authorization mode derived from the configured refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzMode {
    /// Every key is authorized and nothing is refreshed.
    Disabled,
    /// Keys are checked against a snapshot refreshed on this interval.
    Enabled(Duration),
}

impl AuthzMode {
    /// Maps a refresh interval in minutes to a mode; `0` disables.
    #[must_use]
    pub const fn from_interval_minutes(minutes: u64) -> Self {
        if minutes == 0 {
            Self::Disabled
        } else {
            Self::Enabled(Duration::from_secs(minutes.saturating_mul(60)))
        }
    }

    /// Returns true when keys are enforced.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

impl Default for AuthzMode {
    fn default() -> Self {
        Self::from_interval_minutes(DEFAULT_REFRESH_INTERVAL_MINUTES)
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Immutable set of authorized keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthzKeySnapshot {
    /// Authorized keys.
    keys: BTreeSet<String>,
    /// When the set was fetched.
    fetched_at: Option<Timestamp>,
}

impl AuthzKeySnapshot {
    /// Creates a snapshot from a fetched key set.
    #[must_use]
    pub const fn new(keys: BTreeSet<String>, fetched_at: Timestamp) -> Self {
        Self {
            keys,
            fetched_at: Some(fetched_at),
        }
    }

    /// Returns true when the key is in the snapshot.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true when the snapshot holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the fetch time, or `None` before the first refresh.
    #[must_use]
    pub const fn fetched_at(&self) -> Option<Timestamp> {
        self.fetched_at
    }
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Copy-on-write authorization key cache.
pub struct AuthzKeyCache {
    /// Key backend.
    source: Arc<dyn AuthzKeySource>,
    /// Enforcement mode.
    mode: AuthzMode,
    /// Current snapshot pointer.
    snapshot: RwLock<Arc<AuthzKeySnapshot>>,
    /// Event sink for refresh outcomes.
    events: Arc<dyn PullEventSink>,
}

impl AuthzKeyCache {
    /// Creates a cache with an empty snapshot. Call [`Self::refresh`] to load keys.
    #[must_use]
    pub fn new(
        source: Arc<dyn AuthzKeySource>,
        mode: AuthzMode,
        events: Arc<dyn PullEventSink>,
    ) -> Self {
        Self {
            source,
            mode,
            snapshot: RwLock::new(Arc::new(AuthzKeySnapshot::default())),
            events,
        }
    }

    /// Returns the enforcement mode.
    #[must_use]
    pub const fn mode(&self) -> AuthzMode {
        self.mode
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AuthzKeySnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns true when the key is authorized by the current snapshot.
    #[must_use]
    pub fn is_authorized(&self, key: &str) -> bool {
        match self.mode {
            AuthzMode::Disabled => true,
            AuthzMode::Enabled(_) => self.snapshot().contains(key),
        }
    }

    /// Fetches keys and publishes a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when the fetch fails; the previous snapshot
    /// stays in place.
    pub fn refresh(&self) -> Result<Arc<AuthzKeySnapshot>, AuthzError> {
        match self.source.fetch_keys() {
            Ok(keys) => {
                let snapshot = Arc::new(AuthzKeySnapshot::new(keys, Timestamp::now()));
                *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) =
                    Arc::clone(&snapshot);
                self.record(EventOutcome::Success, format!("{} keys loaded", snapshot.len()));
                Ok(snapshot)
            }
            Err(err) => {
                self.record(EventOutcome::Failed, format!("keeping previous keys: {err}"));
                Err(err)
            }
        }
    }

    /// Starts the periodic refresher on the current tokio runtime.
    ///
    /// Returns `Ok(None)` when authorization is disabled. The first refresh
    /// happens one interval after the call; callers load the initial snapshot
    /// with [`Self::refresh`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Source`] when called outside a tokio runtime.
    pub fn spawn_refresher(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>, AuthzError> {
        let AuthzMode::Enabled(period) = self.mode else {
            return Ok(None);
        };
        let handle = Handle::try_current()
            .map_err(|err| AuthzError::Source(format!("no tokio runtime: {err}")))?;
        let cache = Arc::clone(self);
        Ok(Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let worker = Arc::clone(&cache);
                // Fetch errors are recorded inside refresh; only a crashed task is left.
                if let Err(err) = tokio::task::spawn_blocking(move || worker.refresh()).await {
                    cache.record(EventOutcome::Failed, format!("refresh task failed: {err}"));
                }
            }
        })))
    }

    /// Records a refresh event.
    fn record(&self, outcome: EventOutcome, detail: String) {
        self.events.record(&PullEvent::new(
            "authz_refresh",
            "refresh_keys",
            outcome,
            None,
            Some(detail),
        ));
    }
}

// ============================================================================
// SECTION: Key Sources
// ============================================================================

/// Fixed in-memory key set.
#[derive(Debug, Clone, Default)]
pub struct StaticKeySource {
    /// Keys returned on every fetch.
    keys: BTreeSet<String>,
}

impl StaticKeySource {
    /// Creates a source from any collection of keys.
    #[must_use]
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl AuthzKeySource for StaticKeySource {
    fn fetch_keys(&self) -> Result<BTreeSet<String>, AuthzError> {
        Ok(self.keys.clone())
    }
}

/// Key file with one key per line; blank lines and `#` comments are ignored.
#[derive(Debug, Clone)]
pub struct FileKeySource {
    /// Key file path.
    path: PathBuf,
}

impl FileKeySource {
    /// Creates a source reading the given file on every fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the key file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuthzKeySource for FileKeySource {
    fn fetch_keys(&self) -> Result<BTreeSet<String>, AuthzError> {
        let io_error = |err: std::io::Error| AuthzError::Io(format!("{}: {err}", self.path.display()));
        let file = fs::File::open(&self.path).map_err(io_error)?;
        let mut contents = String::new();
        let read = file.take(MAX_KEY_FILE_BYTES + 1).read_to_string(&mut contents).map_err(io_error)?;
        if u64::try_from(read).unwrap_or(u64::MAX) > MAX_KEY_FILE_BYTES {
            return Err(AuthzError::Source(format!(
                "{} exceeds {MAX_KEY_FILE_BYTES} bytes",
                self.path.display()
            )));
        }
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}
