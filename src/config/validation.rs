//! Configuration validation for delivery-docs.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, ComputationConfig, ExportConfig};
use crate::plugins::PluginRegistry;
use std::collections::HashSet;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(validate_order("view_order", &self.view_order));
        errors.extend(validate_order("export_order", &self.export_order));
        errors.extend(self.export.validate());
        errors.extend(self.computation.validate());
        if self.alm.as_deref().is_some_and(|a| a.trim().is_empty()) {
            errors.push(ConfigError::new("alm", "ALM adapter name must not be empty"));
        }
        errors
    }
}

fn validate_order(field: &str, order: &[String]) -> Vec<ConfigError> {
    let mut seen = HashSet::new();
    order
        .iter()
        .filter(|name| !seen.insert(name.as_str()))
        .map(|name| ConfigError::new(field, format!("Data source '{name}' listed more than once")))
        .collect()
}

impl Validatable for ExportConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ConfigError::new("export.title", "Title must not be empty"));
        }
        if self.former_column_label == self.current_column_label {
            errors.push(ConfigError::new(
                "export.current_column_label",
                format!(
                    "Column labels must differ, both are '{}'",
                    self.current_column_label
                ),
            ));
        }
        errors
    }
}

impl Validatable for ComputationConfig {
    fn validate(&self) -> Vec<ConfigError> {
        match self.threads {
            Some(0) => vec![ConfigError::new(
                "computation.threads",
                "Thread count must be at least 1",
            )],
            _ => Vec::new(),
        }
    }
}

impl AppConfig {
    /// Check names that must resolve against a plugin registry.
    ///
    /// Unknown data sources in the orders and an unknown ALM adapter are
    /// reported; plugin settings for unknown names are allowed.
    #[must_use]
    pub fn validate_against(&self, registry: &PluginRegistry) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (field, order) in [("view_order", &self.view_order), ("export_order", &self.export_order)] {
            for name in order {
                if registry.find_import(name).is_none() {
                    errors.push(ConfigError::new(field, format!("Unknown data source '{name}'")));
                }
            }
        }
        if let Some(alm) = &self.alm {
            if registry.alm(alm).is_err() {
                errors.push(ConfigError::new("alm", format!("Unknown ALM adapter '{alm}'")));
            }
        }
        errors
    }
}
