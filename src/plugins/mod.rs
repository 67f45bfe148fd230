//! Plugin registry.
//!
//! The registry is a catalog of data sources ([`ImportStrategy`]),
//! assignment strategies and collaborator factories. Each provider module
//! exposes a `register` function that adds its entries to a
//! [`PluginRegistryBuilder`]; nothing is discovered implicitly.
//!
//! ```
//! use delivery_docs::plugins::PluginRegistry;
//!
//! let registry = PluginRegistry::with_builtins();
//! assert!(registry.import("version").is_ok());
//! assert!(registry.find_strategy("no-such-strategy").is_none());
//! ```

mod import;
mod shared;

pub use import::{ImportStrategy, Presentation, COMMITS_SOURCE, NOTES_SOURCE, VERSION_SOURCE};
pub use shared::{global, SharedRegistry};

use crate::collaborators::{AlmFactory, VcsFactory};
use crate::error::{DeliveryError, Result};
use crate::strategy::AssignmentStrategy;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Read-only catalog of registered plugins.
#[derive(Default)]
pub struct PluginRegistry {
    imports: IndexMap<String, ImportStrategy>,
    strategies: IndexMap<String, Arc<dyn AssignmentStrategy>>,
    vcs: IndexMap<String, VcsFactory>,
    alm: IndexMap<String, AlmFactory>,
}

impl PluginRegistry {
    /// Start an empty builder
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    /// Registry holding every built-in data source, strategy and adapter
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut builder = Self::builder();
        builder.register_builtins();
        builder.build()
    }

    /// Data source by name
    pub fn import(&self, name: &str) -> Result<&ImportStrategy> {
        self.find_import(name)
            .ok_or_else(|| DeliveryError::not_found("import strategy", name))
    }

    #[must_use]
    pub fn find_import(&self, name: &str) -> Option<&ImportStrategy> {
        self.imports.get(name)
    }

    /// Assignment strategy by name
    pub fn strategy(&self, name: &str) -> Result<Arc<dyn AssignmentStrategy>> {
        self.find_strategy(name)
            .ok_or_else(|| DeliveryError::not_found("assignment strategy", name))
    }

    #[must_use]
    pub fn find_strategy(&self, name: &str) -> Option<Arc<dyn AssignmentStrategy>> {
        self.strategies.get(name).cloned()
    }

    /// Version-control factory by name
    pub fn vcs(&self, name: &str) -> Result<&VcsFactory> {
        self.vcs
            .get(name)
            .ok_or_else(|| DeliveryError::not_found("version control adapter", name))
    }

    /// Name of the first registered version-control adapter
    #[must_use]
    pub fn default_vcs(&self) -> Option<&str> {
        self.vcs.keys().next().map(String::as_str)
    }

    /// ALM factory by name
    pub fn alm(&self, name: &str) -> Result<&AlmFactory> {
        self.alm
            .get(name)
            .ok_or_else(|| DeliveryError::not_found("ALM adapter", name))
    }

    /// All data sources in registration order
    pub fn imports(&self) -> impl Iterator<Item = &ImportStrategy> {
        self.imports.values()
    }

    /// All assignment strategies in registration order
    pub fn strategies(&self) -> impl Iterator<Item = &Arc<dyn AssignmentStrategy>> {
        self.strategies.values()
    }

    /// Data sources arranged by a configured order.
    ///
    /// Names listed in `order` come first, in that order (unknown names are
    /// skipped with a warning); the remaining sources follow sorted by name.
    #[must_use]
    pub fn imports_in_order(&self, order: &[String]) -> Vec<&ImportStrategy> {
        let mut out: Vec<&ImportStrategy> = Vec::with_capacity(self.imports.len());
        for name in order {
            match self.imports.get(name) {
                Some(import) if !out.iter().any(|i| i.name == import.name) => out.push(import),
                Some(_) => {}
                None => tracing::warn!(source = %name, "Configured order names an unknown data source"),
            }
        }
        let mut rest: Vec<&ImportStrategy> = self
            .imports
            .values()
            .filter(|i| !out.iter().any(|o| o.name == i.name))
            .collect();
        rest.sort_by(|a, b| a.name.cmp(&b.name));
        out.extend(rest);
        out
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("imports", &self.imports.keys().collect::<Vec<_>>())
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("vcs", &self.vcs.keys().collect::<Vec<_>>())
            .field("alm", &self.alm.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registrations before freezing them into a [`PluginRegistry`].
///
/// Registering a name twice replaces the earlier entry.
#[derive(Default)]
#[must_use]
pub struct PluginRegistryBuilder {
    registry: PluginRegistry,
}

impl PluginRegistryBuilder {
    pub fn register_import(&mut self, import: ImportStrategy) -> &mut Self {
        tracing::debug!(source = %import.name, "Registering data source");
        self.registry.imports.insert(import.name.clone(), import);
        self
    }

    pub fn register_strategy(&mut self, strategy: Arc<dyn AssignmentStrategy>) -> &mut Self {
        self.registry
            .strategies
            .insert(strategy.name().to_string(), strategy);
        self
    }

    pub fn register_vcs(&mut self, name: impl Into<String>, factory: VcsFactory) -> &mut Self {
        self.registry.vcs.insert(name.into(), factory);
        self
    }

    pub fn register_alm(&mut self, name: impl Into<String>, factory: AlmFactory) -> &mut Self {
        self.registry.alm.insert(name.into(), factory);
        self
    }

    /// Register every built-in provider
    pub fn register_builtins(&mut self) -> &mut Self {
        import::register(self);
        crate::strategy::register(self);
        crate::collaborators::register(self);
        self
    }

    pub fn build(self) -> PluginRegistry {
        self.registry
    }
}
