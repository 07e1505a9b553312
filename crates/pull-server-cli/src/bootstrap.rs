// crates/pull-server-cli/src/bootstrap.rs
// ============================================================================
// Module: Pull Server Bootstrap
// Description: Wires validated configuration into a ready pull handler.
// Purpose: Build the event sink, provider registry, store, and key cache once.
// Dependencies: pull-server-config, pull-server-core, pull-server-providers,
//               pull-server-store-sqlite, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`PullServer::from_config`] turns a [`PullServerConfig`] into a
//! [`PullHandler`] in a fixed order: event sink, provider registry, store,
//! key cache, handler. Every step fails closed. The individual builders are
//! public so operator commands can construct only the parts they need.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use pull_server_config::ActionDispatchMode;
use pull_server_config::EventSinkType;
use pull_server_config::PullServerConfig;
use pull_server_config::StoreType;
use pull_server_core::AuthzKeyCache;
use pull_server_core::AuthzKeySource;
use pull_server_core::ChecksumActionDispatcher;
use pull_server_core::ChecksumProduct;
use pull_server_core::ChecksumService;
use pull_server_core::FileEventSink;
use pull_server_core::FileKeySource;
use pull_server_core::InMemoryPullStore;
use pull_server_core::NoopEventSink;
use pull_server_core::ProviderSource;
use pull_server_core::PullEventSink;
use pull_server_core::PullHandler;
use pull_server_core::PullStore;
use pull_server_core::StaticKeySource;
use pull_server_core::StderrEventSink;
use pull_server_providers::ProviderRegistry;
use pull_server_providers::RegistrySettings;
use pull_server_providers::checksum_capabilities;
use pull_server_store_sqlite::SqlitePullStore;
use thiserror::Error;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Provider manifest directory scanned next to the config file.
pub const PROVIDERS_DIR_NAME: &str = "providers.d";

/// Checksum provider registry used by the server.
pub type ChecksumRegistry = ProviderRegistry<ChecksumProduct>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Bootstrap failures, tagged by the step that failed.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration is inconsistent.
    #[error("config error: {0}")]
    Config(String),
    /// Event sink could not be opened.
    #[error("event sink error: {0}")]
    Events(String),
    /// Provider registry could not be built or the default algorithm is unusable.
    #[error("provider error: {0}")]
    Providers(String),
    /// Store could not be opened.
    #[error("store error: {0}")]
    Store(String),
    /// Initial key load or refresher start failed.
    #[error("authorization error: {0}")]
    Authz(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Fully wired pull server components.
pub struct PullServer {
    /// Protocol handler.
    handler: PullHandler,
    /// Checksum provider registry shared with the handler.
    registry: Arc<ChecksumRegistry>,
    /// Registration key cache shared with the handler.
    key_cache: Arc<AuthzKeyCache>,
}

impl PullServer {
    /// Builds every component from configuration.
    ///
    /// The key cache is loaded once before the handler is returned, and the
    /// default checksum algorithm is exercised so a bad provider selection
    /// fails here instead of on the first request.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] naming the first step that failed.
    pub fn from_config(config: &PullServerConfig) -> Result<Self, BootstrapError> {
        config.validate().map_err(|err| BootstrapError::Config(err.to_string()))?;
        let events = build_event_sink(config)?;
        let registry = Arc::new(build_registry(config, events.as_ref())?);
        let checksum_source: Arc<dyn ProviderSource<ChecksumProduct>> = registry.clone();
        ChecksumService::new(Arc::clone(&checksum_source), config.checksum.settings())
            .compute(&[])
            .map_err(|err| {
                BootstrapError::Providers(format!(
                    "checksum.default_algorithm {} is unusable: {err}",
                    config.checksum.default_algorithm
                ))
            })?;
        let store = build_store(config)?;
        let key_cache = build_key_cache(config, Arc::clone(&events));
        if key_cache.mode().is_enabled() {
            key_cache.refresh().map_err(|err| BootstrapError::Authz(err.to_string()))?;
        }

        let mut handler =
            PullHandler::new(store, checksum_source, events, config.handler_config())
                .with_authz(Arc::clone(&key_cache));
        if config.handler.action_dispatch == ActionDispatchMode::Checksum {
            handler = handler.with_action_dispatcher(Arc::new(ChecksumActionDispatcher));
        }
        Ok(Self {
            handler,
            registry,
            key_cache,
        })
    }

    /// Returns the protocol handler.
    #[must_use]
    pub const fn handler(&self) -> &PullHandler {
        &self.handler
    }

    /// Returns the checksum provider registry.
    #[must_use]
    pub fn registry(&self) -> &ChecksumRegistry {
        &self.registry
    }

    /// Returns the registration key cache.
    #[must_use]
    pub const fn key_cache(&self) -> &Arc<AuthzKeyCache> {
        &self.key_cache
    }

    /// Returns non-fatal provider discovery warnings.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.registry.warnings()
    }

    /// Starts the periodic key refresher on the current tokio runtime.
    ///
    /// Returns `Ok(None)` when authorization is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Authz`] when no tokio runtime is running.
    pub fn spawn_key_refresher(&self) -> Result<Option<JoinHandle<()>>, BootstrapError> {
        self.key_cache.spawn_refresher().map_err(|err| BootstrapError::Authz(err.to_string()))
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Opens the configured event sink.
///
/// # Errors
///
/// Returns [`BootstrapError::Events`] when the event log cannot be opened.
pub fn build_event_sink(
    config: &PullServerConfig,
) -> Result<Arc<dyn PullEventSink>, BootstrapError> {
    match config.events.sink {
        EventSinkType::Stderr => Ok(Arc::new(StderrEventSink)),
        EventSinkType::None => Ok(Arc::new(NoopEventSink)),
        EventSinkType::File => {
            let path = config.events.path.as_ref().ok_or_else(|| {
                BootstrapError::Config("events.sink=file requires events.path".to_string())
            })?;
            let sink = FileEventSink::new(path)
                .map_err(|err| BootstrapError::Events(format!("{}: {err}", path.display())))?;
            Ok(Arc::new(sink))
        }
    }
}

/// Maps the providers section onto registry settings.
///
/// `providers.d` next to the config file is a default search location when
/// it exists.
#[must_use]
pub fn registry_settings(config: &PullServerConfig) -> RegistrySettings {
    let default_search_paths: Vec<PathBuf> = config
        .config_dir()
        .map(|dir| dir.join(PROVIDERS_DIR_NAME))
        .filter(|path| path.is_dir())
        .into_iter()
        .collect();
    RegistrySettings {
        builtins: config.providers.builtins.clone(),
        default_search_paths,
        search_paths: config.providers.search_paths.clone(),
        replace_builtins: config.providers.replace_builtins,
        replace_search_paths: config.providers.replace_search_paths,
    }
}

/// Builds the checksum provider registry.
///
/// # Errors
///
/// Returns [`BootstrapError::Providers`] on name collisions or unknown
/// built-ins.
pub fn build_registry(
    config: &PullServerConfig,
    events: &dyn PullEventSink,
) -> Result<ChecksumRegistry, BootstrapError> {
    ProviderRegistry::build(&checksum_capabilities(), &registry_settings(config), events)
        .map_err(|err| BootstrapError::Providers(err.to_string()))
}

/// Opens the configured store.
///
/// # Errors
///
/// Returns [`BootstrapError::Store`] when the `SQLite` store cannot be opened.
pub fn build_store(config: &PullServerConfig) -> Result<Arc<dyn PullStore>, BootstrapError> {
    match config.store.store_type {
        StoreType::Memory => Ok(Arc::new(InMemoryPullStore::new())),
        StoreType::Sqlite => {
            let sqlite = config.store.sqlite.as_ref().ok_or_else(|| {
                BootstrapError::Config("sqlite store requires store.sqlite.path".to_string())
            })?;
            let store =
                SqlitePullStore::new(sqlite).map_err(|err| BootstrapError::Store(err.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds an unloaded key cache.
///
/// Without `authz.keys_path` the key set is empty, so keyed registration is
/// refused while authorization is enabled.
#[must_use]
pub fn build_key_cache(
    config: &PullServerConfig,
    events: Arc<dyn PullEventSink>,
) -> Arc<AuthzKeyCache> {
    let source: Arc<dyn AuthzKeySource> = match &config.authz.keys_path {
        Some(path) => Arc::new(FileKeySource::new(path.clone())),
        None => Arc::new(StaticKeySource::default()),
    };
    Arc::new(AuthzKeyCache::new(source, config.authz.mode(), events))
}
