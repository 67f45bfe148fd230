//! Data source (import strategy) descriptors.

use super::PluginRegistryBuilder;
use crate::model::{DeliveryInformation, InformationKind};
use serde::{Deserialize, Serialize};

/// Version data source name.
pub const VERSION_SOURCE: &str = "version";
/// Free-text notes data source name.
pub const NOTES_SOURCE: &str = "notes";
/// Commit log data source name.
pub const COMMITS_SOURCE: &str = "commits";

/// How a data source is presented when editing or viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presentation {
    SingleLine,
    MultiLine,
    Table,
}

/// Descriptor of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStrategy {
    pub name: String,
    pub version: String,
    pub license: String,
    /// Variant of information this source produces
    pub kind: InformationKind,
    /// Whether produced items can be ordered by time
    pub sortable: bool,
    pub presentation: Presentation,
    /// Names of accepted assignment strategies
    pub strategies: Vec<String>,
}

impl ImportStrategy {
    pub fn new(name: impl Into<String>, kind: InformationKind) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            license: "MIT".to_string(),
            kind,
            sortable: matches!(kind, InformationKind::Commits),
            presentation: match kind {
                InformationKind::Version => Presentation::SingleLine,
                InformationKind::Text => Presentation::MultiLine,
                InformationKind::Commits => Presentation::Table,
            },
            strategies: Vec::new(),
        }
    }

    #[must_use]
    pub fn accepting<I, S>(mut self, strategies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies.extend(strategies.into_iter().map(Into::into));
        self
    }

    /// Whether the named assignment strategy may be configured
    #[must_use]
    pub fn accepts(&self, strategy: &str) -> bool {
        self.strategies.iter().any(|s| s == strategy)
    }

    /// Fresh empty information of this source's variant
    #[must_use]
    pub fn new_information(&self) -> DeliveryInformation {
        DeliveryInformation::empty(&self.name, self.kind)
    }
}

/// Register the built-in data sources.
pub fn register(builder: &mut PluginRegistryBuilder) {
    builder.register_import(
        ImportStrategy::new(VERSION_SOURCE, InformationKind::Version).accepting([
            "ignore", "text", "file", "command", "random", "subtree", "vcs-tag",
        ]),
    );
    builder.register_import(
        ImportStrategy::new(NOTES_SOURCE, InformationKind::Text)
            .accepting(["ignore", "text", "file", "command", "subtree"]),
    );
    builder.register_import(
        ImportStrategy::new(COMMITS_SOURCE, InformationKind::Commits)
            .accepting(["ignore", "vcs-commits", "subtree"]),
    );
}
