//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".delivery-docs.yaml",
    ".delivery-docs.yml",
    "delivery-docs.yaml",
    "delivery-docs.yml",
];

/// Directory below the user config directory.
const CONFIG_DIR_NAME: &str = "delivery-docs";

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/delivery-docs/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    if let Some(path) = cwd.as_deref().and_then(find_config_in_dir) {
        return Some(path);
    }

    if let Some(path) = cwd
        .as_deref()
        .and_then(find_git_root)
        .and_then(|root| find_config_in_dir(&root))
    {
        return Some(path);
    }

    if let Some(path) =
        dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join(CONFIG_DIR_NAME)))
    {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up from `start`.
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Only values that differ from the defaults override; plugin settings
    /// are merged key by key.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.view_order != defaults.view_order {
            self.view_order.clone_from(&other.view_order);
        }
        if other.export_order != defaults.export_order {
            self.export_order.clone_from(&other.export_order);
        }
        for (name, settings) in &other.plugins {
            let target = self.plugins.entry(name.clone()).or_default();
            target.values.extend(settings.values.clone());
            target.lists.extend(settings.lists.clone());
        }
        if other.alm.is_some() {
            self.alm.clone_from(&other.alm);
        }

        if other.export.customer_mode {
            self.export.customer_mode = true;
        }
        if other.export.title != defaults.export.title {
            self.export.title.clone_from(&other.export.title);
        }
        if other.export.former_column_label != defaults.export.former_column_label {
            self.export
                .former_column_label
                .clone_from(&other.export.former_column_label);
        }
        if other.export.current_column_label != defaults.export.current_column_label {
            self.export
                .current_column_label
                .clone_from(&other.export.current_column_label);
        }

        if other.computation.threads.is_some() {
            self.computation.threads = other.computation.threads;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# delivery-docs configuration
# Place this file at .delivery-docs.yaml in your project root or ~/.config/delivery-docs/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# delivery-docs configuration file
# =================================
#
# Place it at:
#   - .delivery-docs.yaml in your project root
#   - ~/.config/delivery-docs/delivery-docs.yaml for global config
#
# CLI arguments always override file settings.

# Data sources listed by `delivery-docs plugins`, in this order
view_order: [version, notes, commits]

# Document sections, in this order
export_order: [version, notes, commits]

# Per-plugin settings
plugins:
  commits:
    values:
      # Version-control adapter (default: first registered)
      vcs: git

# ALM adapter used to filter exported commits (optional)
# alm: tracker

export:
  # Only export customer-relevant components
  customer_mode: false
  title: Delivery notes
  former_column_label: Former
  current_column_label: Current

computation:
  # Worker threads (default: number of CPUs)
  # threads: 4
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".delivery-docs.yaml");
        std::fs::write(&config_path, "export:\n  customer_mode: true\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_find_git_root_walks_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_git_root(&nested), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
export_order: [commits]
plugins:
  commits:
    values:
      vcs: git
    lists:
      ignore: [vendor, third_party]
export:
  customer_mode: true
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.export_order, vec!["commits"]);
        assert_eq!(config.plugin_settings("commits").value("vcs"), Some("git"));
        assert_eq!(config.plugin_settings("commits").list("ignore").len(), 2);
        assert!(config.export.customer_mode);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::builder().plugin_value("commits", "vcs", "git").build();
        let overrides = AppConfig::builder()
            .plugin_value("commits", "depth", "50")
            .customer_mode(true)
            .threads(3)
            .build();

        base.merge(&overrides);

        let settings = base.plugin_settings("commits");
        assert_eq!(settings.value("vcs"), Some("git"));
        assert_eq!(settings.value("depth"), Some("50"));
        assert!(base.export.customer_mode);
        assert_eq!(base.computation.threads, Some(3));
    }

    #[test]
    fn test_file_values_kept_unless_overridden() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("delivery-docs.yaml");
        std::fs::write(&config_path, "export:\n  title: Release 7\ncomputation:\n  threads: 2\n").unwrap();

        let overrides = AppConfig::builder().threads(8).build();
        let (config, loaded_from) = AppConfig::from_file_with_overrides(Some(&config_path), &overrides);
        assert_eq!(loaded_from, Some(config_path));
        assert_eq!(config.export.title, "Release 7");
        assert_eq!(config.computation.threads, Some(8));
        assert!(!config.export.customer_mode);
    }

    #[test]
    fn test_example_configs_parse() {
        let example = generate_example_config();
        assert!(example.contains("export_order"));
        let parsed: AppConfig = serde_yaml::from_str(&generate_full_example_config()).unwrap();
        assert_eq!(parsed.plugin_settings("commits").value("vcs"), Some("git"));
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "view_order: [notes]\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
