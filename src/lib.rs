//! **Per-delivery change aggregation and DocBook release documents.**
//!
//! `delivery-docs` tracks a product as a tree of components and a set of
//! named deliveries (releases). For every component, delivery and data
//! source (a version string, free-form notes, version-control commits) it
//! computes a piece of *delivery information* through a configurable
//! assignment strategy, and renders the result as a DocBook article that
//! compares each delivery with the one before it.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: deliveries and their total order, the component tree and
//!   the information stored under a `(delivery, source)` key.
//! - **[`plugins`]**: the explicit [`PluginRegistry`] of data sources,
//!   assignment strategies and collaborator adapters.
//! - **[`strategy`]**: the built-in assignment strategies (`text`, `file`,
//!   `command`, `subtree`, `vcs-commits`, ...).
//! - **[`pipeline`]**: strategy dispatch and background computation over a
//!   snapshot of the project.
//! - **[`traversal`]**: generic tree walks with early termination.
//! - **[`docbook`]**: DocBook export and delivery diff rendering.
//! - **[`project`]**: the project aggregate and its XML persistence.
//!
//! ## Getting Started
//!
//! ```
//! use delivery_docs::docbook::DocbookDocument;
//! use delivery_docs::model::{Component, Delivery, StrategyAssignment};
//! use delivery_docs::{AppConfig, PluginRegistry, Project};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PluginRegistry::with_builtins();
//!     let config = AppConfig::default();
//!
//!     let mut project = Project::new("product");
//!     project.add_delivery(Delivery::new("1.0"))?;
//!     project.add_component("product", Component::new("core"))?;
//!     project.assign(
//!         &registry,
//!         "product.core",
//!         "version",
//!         StrategyAssignment::new("text", ["1.0.0"]),
//!     )?;
//!
//!     let snapshot = project.snapshot(std::env::current_dir()?);
//!     let report = delivery_docs::pipeline::run(
//!         &snapshot,
//!         &Default::default(),
//!         &registry,
//!         &config,
//!     )?;
//!     project.apply(&report);
//!
//!     let mut document = DocbookDocument::new("Delivery notes");
//!     let options = project.export_options(&config, "1.0")?;
//!     project.export(&registry, options, &mut document)?;
//!     assert!(document.section("version").is_some());
//!     Ok(())
//! }
//! ```

#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod docbook;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod plugins;
pub mod project;
pub mod strategy;
pub mod traversal;

pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use docbook::{DocbookDocument, DocbookExporter, ExportOptions, ExportSummary};
pub use error::{DeliveryError, ErrorContext, OptionContext, Result};
pub use model::{
    Component, Delivery, DeliveryInformation, DeliveryRegistry, InfoKey, InformationKind,
    StrategyAssignment,
};
pub use pipeline::{ComputationJob, ComputationPlan, ComputationReport, ComputationSnapshot};
pub use plugins::{ImportStrategy, PluginRegistry, SharedRegistry};
pub use project::Project;
pub use strategy::AssignmentStrategy;
