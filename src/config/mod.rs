//! Configuration module for delivery-docs.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust
//! use delivery_docs::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .export_order(["version", "commits"])
//!     .plugin_value("commits", "vcs", "git")
//!     .customer_mode(true)
//!     .build();
//! assert!(config.export.customer_mode);
//! ```
//!
//! # Configuration File
//!
//! Place a `.delivery-docs.yaml` file in your project root or
//! `~/.config/delivery-docs/`:
//!
//! ```yaml
//! export_order: [version, notes, commits]
//! plugins:
//!   commits:
//!     values:
//!       vcs: git
//! export:
//!   customer_mode: true
//! ```

pub mod file;
mod types;
mod validation;

pub use types::{AppConfig, AppConfigBuilder, ComputationConfig, ExportConfig, PluginSettings};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, generate_full_example_config, load_config_file,
    load_or_default, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.delivery-docs.yaml` config files. It can be used by editors for
/// validation and autocompletion.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
