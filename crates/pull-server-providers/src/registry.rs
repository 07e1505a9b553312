// crates/pull-server-providers/src/registry.rs
// ============================================================================
// Module: Provider Registry
// Description: Capability table, manifest discovery, and name resolution.
// Purpose: Build a closed, collision-free provider set once per process.
// Dependencies: pull-server-core
// ============================================================================

//! ## Overview
//! The registry is built once from two inputs:
//! - a [`CapabilityTable`] of statically linked implementations, of which a
//!   configured subset becomes the built-in providers
//! - search locations scanned for `*.toml` [`ProviderManifest`] files
//!
//! Names are listed built-ins first (table order), then discovered providers
//! (locations in order, files sorted by name). Two providers with the same
//! name fail the build. Unreadable locations, bad manifests, and manifests
//! naming unknown implementations are warnings: they are kept on the registry
//! and recorded through the event sink, and the build continues.
//!
//! Every resolve returns a fresh, unconfigured provider.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use pull_server_core::DynProvider;
use pull_server_core::EventOutcome;
use pull_server_core::Product;
use pull_server_core::ProviderError;
use pull_server_core::ProviderSource;
use pull_server_core::PullEvent;
use pull_server_core::PullEventSink;
use thiserror::Error;

use crate::manifest::ManifestProvider;
use crate::manifest::ProviderManifest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Candidate label used when a discovered provider collides with a built-in.
pub const BUILTIN_CANDIDATE: &str = "built-in";
/// File extension of provider manifests.
const MANIFEST_EXTENSION: &str = "toml";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal registry build errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two candidates declare the same provider name.
    #[error("provider name collision for {name}: {first} and {second}")]
    Collision {
        /// Colliding provider name.
        name: String,
        /// First candidate (manifest path or `built-in`).
        first: String,
        /// Second candidate (manifest path).
        second: String,
    },
    /// Registry settings are invalid.
    #[error("invalid provider registry settings: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Capability Table
// ============================================================================

/// Factory creating a fresh provider.
pub type ProviderFactory<P> = fn() -> DynProvider<P>;

/// Statically linked map of implementation name to factory.
pub struct CapabilityTable<P> {
    /// Entries in declaration order.
    entries: Vec<(String, ProviderFactory<P>)>,
}

impl<P> CapabilityTable<P> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an entry, replacing an existing entry of the same name in place.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, factory: ProviderFactory<P>) -> Self {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            entry.1 = factory;
        } else {
            self.entries.push((name, factory));
        }
        self
    }

    /// Returns the factory for an implementation name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ProviderFactory<P>> {
        self.entries.iter().find(|(existing, _)| existing == name).map(|(_, factory)| *factory)
    }

    /// Returns implementation names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl<P> Default for CapabilityTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Inputs controlling registry construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Built-in subset; `None` keeps every table entry.
    pub builtins: Option<Vec<String>>,
    /// Search locations shipped with the deployment.
    pub default_search_paths: Vec<PathBuf>,
    /// Search locations from configuration.
    pub search_paths: Vec<PathBuf>,
    /// Discovered providers replace built-ins instead of adding to them.
    pub replace_builtins: bool,
    /// Configured locations replace default locations instead of adding to them.
    pub replace_search_paths: bool,
}

impl RegistrySettings {
    /// Returns the effective search locations in scan order.
    #[must_use]
    pub fn effective_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = if self.replace_search_paths {
            Vec::new()
        } else {
            self.default_search_paths.clone()
        };
        paths.extend(self.search_paths.iter().cloned());
        paths
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Origin of a registry entry.
enum EntrySource<P> {
    /// Statically linked built-in.
    Builtin(ProviderFactory<P>),
    /// Discovered through a manifest.
    Manifest {
        /// Parsed manifest.
        manifest: ProviderManifest,
        /// Implementation factory.
        factory: ProviderFactory<P>,
    },
}

/// Discovered manifest awaiting collision checks.
struct Discovered<P> {
    /// Parsed manifest.
    manifest: ProviderManifest,
    /// Implementation factory.
    factory: ProviderFactory<P>,
    /// Manifest path.
    path: PathBuf,
}

/// Closed set of named providers.
pub struct ProviderRegistry<P> {
    /// Entries in listing order.
    entries: Vec<(String, EntrySource<P>)>,
    /// Entry index by name.
    index: BTreeMap<String, usize>,
    /// Non-fatal discovery warnings.
    warnings: Vec<String>,
}

impl<P: Product + 'static> ProviderRegistry<P> {
    /// Builds a registry from a capability table and settings.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Collision`] when two candidates share a name
    /// and [`RegistryError::Invalid`] when a configured built-in is not in
    /// the table.
    pub fn build(
        table: &CapabilityTable<P>,
        settings: &RegistrySettings,
        events: &dyn PullEventSink,
    ) -> Result<Self, RegistryError> {
        let mut builtins = select_builtins(table, settings.builtins.as_deref())?;
        let mut warnings = Vec::new();
        let discovered = discover(table, &settings.effective_search_paths(), &mut warnings);

        for warning in &warnings {
            events.record(&PullEvent::new(
                "provider_registry",
                "discover_providers",
                EventOutcome::Warning,
                None,
                Some(warning.clone()),
            ));
        }

        let mut first_seen: BTreeMap<&str, &Path> = BTreeMap::new();
        for candidate in &discovered {
            if let Some(first) = first_seen.insert(&candidate.manifest.name, &candidate.path) {
                return Err(RegistryError::Collision {
                    name: candidate.manifest.name.clone(),
                    first: first.display().to_string(),
                    second: candidate.path.display().to_string(),
                });
            }
        }

        if settings.replace_builtins {
            builtins.clear();
        } else if let Some(candidate) = discovered
            .iter()
            .find(|candidate| builtins.iter().any(|(name, _)| *name == candidate.manifest.name))
        {
            return Err(RegistryError::Collision {
                name: candidate.manifest.name.clone(),
                first: BUILTIN_CANDIDATE.to_string(),
                second: candidate.path.display().to_string(),
            });
        }

        let mut entries: Vec<(String, EntrySource<P>)> = builtins
            .into_iter()
            .map(|(name, factory)| (name, EntrySource::Builtin(factory)))
            .collect();
        entries.extend(discovered.into_iter().map(|candidate| {
            (
                candidate.manifest.name.clone(),
                EntrySource::Manifest {
                    manifest: candidate.manifest,
                    factory: candidate.factory,
                },
            )
        }));
        let index =
            entries.iter().enumerate().map(|(position, (name, _))| (name.clone(), position)).collect();
        Ok(Self {
            entries,
            index,
            warnings,
        })
    }

    /// Returns provider names in listing order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Returns non-fatal discovery warnings.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns true when no provider is resolvable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a fresh, unconfigured provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Resolution`] for an empty registry and
    /// [`ProviderError::NotFound`] for unknown names.
    pub fn resolve(&self, name: &str) -> Result<DynProvider<P>, ProviderError> {
        if self.entries.is_empty() {
            return Err(ProviderError::Resolution("no providers are resolvable".to_string()));
        }
        let (_, source) = self
            .index
            .get(name)
            .and_then(|position| self.entries.get(*position))
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;
        Ok(match source {
            EntrySource::Builtin(factory) => factory(),
            EntrySource::Manifest {
                manifest,
                factory,
            } => Box::new(ManifestProvider::new(manifest, factory())),
        })
    }
}

impl<P: Product + 'static> ProviderSource<P> for ProviderRegistry<P> {
    fn provider_names(&self) -> Vec<String> {
        self.names()
    }

    fn resolve(&self, name: &str) -> Result<DynProvider<P>, ProviderError> {
        Self::resolve(self, name)
    }
}

// ============================================================================
// SECTION: Build Helpers
// ============================================================================

/// Selects built-ins from the table, keeping table order.
fn select_builtins<P>(
    table: &CapabilityTable<P>,
    selection: Option<&[String]>,
) -> Result<Vec<(String, ProviderFactory<P>)>, RegistryError> {
    if let Some(selection) = selection
        && let Some(unknown) = selection.iter().find(|name| table.get(name).is_none())
    {
        return Err(RegistryError::Invalid(format!("unknown built-in provider: {unknown}")));
    }
    Ok(table
        .entries
        .iter()
        .filter(|(name, _)| selection.is_none_or(|selection| selection.contains(name)))
        .map(|(name, factory)| (name.clone(), *factory))
        .collect())
}

/// Scans search locations for manifests, collecting warnings.
fn discover<P: Product + 'static>(
    table: &CapabilityTable<P>,
    locations: &[PathBuf],
    warnings: &mut Vec<String>,
) -> Vec<Discovered<P>> {
    let mut discovered = Vec::new();
    for location in locations {
        let entries = match fs::read_dir(location) {
            Ok(entries) => entries,
            Err(err) => {
                warnings.push(format!("skipping search path {}: {err}", location.display()));
                continue;
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|extension| extension == MANIFEST_EXTENSION)
            })
            .collect();
        files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));

        for path in files {
            let manifest = match ProviderManifest::load(&path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warnings.push(format!("skipping manifest {}: {err}", path.display()));
                    continue;
                }
            };
            let Some(factory) = table.get(&manifest.implementation) else {
                warnings.push(format!(
                    "skipping manifest {}: unknown implementation {}",
                    path.display(),
                    manifest.implementation
                ));
                continue;
            };
            if let Err(err) = check_presets(&manifest, factory) {
                warnings.push(format!("skipping manifest {}: {err}", path.display()));
                continue;
            }
            discovered.push(Discovered {
                manifest,
                factory,
                path,
            });
        }
    }
    discovered
}

/// Validates manifest presets against a fresh instance of the implementation.
///
/// Presets must name accepted parameters. When they also cover every required
/// parameter they are applied on their own, so rejected values surface here
/// rather than at first resolve.
fn check_presets<P: Product + 'static>(
    manifest: &ProviderManifest,
    factory: ProviderFactory<P>,
) -> Result<(), ProviderError> {
    if manifest.parameters.is_empty() {
        return Ok(());
    }
    let mut provider = factory();
    let accepted = provider.describe_parameters();
    if let Some(unknown) = manifest
        .parameters
        .keys()
        .find(|name| !accepted.iter().any(|parameter| parameter.name() == name.as_str()))
    {
        return Err(ProviderError::Validation(format!("unknown preset parameter: {unknown}")));
    }
    let complete = accepted
        .iter()
        .filter(|parameter| parameter.is_required())
        .all(|parameter| manifest.parameters.contains_key(parameter.name()));
    if complete {
        provider.set_parameters(manifest.parameters.clone())?;
    }
    Ok(())
}
