//! Configuration types for delivery-docs operations.
//!
//! Provides structured configuration for viewing, computing and exporting
//! delivery information.

use crate::plugins::{COMMITS_SOURCE, NOTES_SOURCE, VERSION_SOURCE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// This is the top-level configuration struct that aggregates all configuration
/// options. It can be constructed from CLI arguments, config files, or both
/// (with CLI overriding file settings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Data sources shown when listing information, in this order
    pub view_order: Vec<String>,
    /// Data sources exported as document sections, in this order
    pub export_order: Vec<String>,
    /// Settings per plugin, keyed by data source or adapter name
    pub plugins: BTreeMap<String, PluginSettings>,
    /// ALM adapter used to filter exported commits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alm: Option<String>,
    /// Document export options
    pub export: ExportConfig,
    /// Background computation options
    pub computation: ComputationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let order: Vec<String> = [VERSION_SOURCE, NOTES_SOURCE, COMMITS_SOURCE]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        Self {
            view_order: order.clone(),
            export_order: order,
            plugins: BTreeMap::new(),
            alm: None,
            export: ExportConfig::default(),
            computation: ComputationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Settings for a plugin; empty settings when none are configured
    #[must_use]
    pub fn plugin_settings(&self, name: &str) -> &PluginSettings {
        static EMPTY: PluginSettings = PluginSettings {
            values: BTreeMap::new(),
            lists: BTreeMap::new(),
        };
        self.plugins.get(name).unwrap_or(&EMPTY)
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the order data sources are listed in.
    pub fn view_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.view_order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Set the order document sections are exported in.
    pub fn export_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.export_order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Set a single key/value setting for a plugin.
    pub fn plugin_value(
        mut self,
        plugin: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config
            .plugins
            .entry(plugin.into())
            .or_default()
            .values
            .insert(key.into(), value.into());
        self
    }

    /// Select the ALM adapter used during export.
    pub fn alm(mut self, adapter: impl Into<String>) -> Self {
        self.config.alm = Some(adapter.into());
        self
    }

    /// Export only customer-relevant components.
    pub const fn customer_mode(mut self, enabled: bool) -> Self {
        self.config.export.customer_mode = enabled;
        self
    }

    /// Set the document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.export.title = title.into();
        self
    }

    /// Set the number of computation worker threads.
    pub const fn threads(mut self, threads: usize) -> Self {
        self.config.computation.threads = Some(threads);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Plugin Settings
// ============================================================================

/// Key/value and key/list settings of one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PluginSettings {
    /// Single-valued settings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
    /// Multi-valued settings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<String, Vec<String>>,
}

impl PluginSettings {
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// A list setting; empty when unset
    #[must_use]
    pub fn list(&self, key: &str) -> &[String] {
        self.lists.get(key).map_or(&[], Vec::as_slice)
    }
}

// ============================================================================
// Export Configuration
// ============================================================================

/// DocBook export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExportConfig {
    /// Skip components not flagged as customer relevant
    pub customer_mode: bool,
    /// Title of a newly created document
    pub title: String,
    /// Header of the former delivery column in version tables
    pub former_column_label: String,
    /// Header of the current delivery column in version tables
    pub current_column_label: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            customer_mode: false,
            title: "Delivery notes".to_string(),
            former_column_label: "Former".to_string(),
            current_column_label: "Current".to_string(),
        }
    }
}

// ============================================================================
// Computation Configuration
// ============================================================================

/// Background computation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ComputationConfig {
    /// Worker threads (default: number of CPUs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}
