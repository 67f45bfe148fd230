//! A project: the delivery registry plus the component tree.
//!
//! The project is owned by a single foreground context. Computations run on
//! a [`ComputationSnapshot`] and their report is applied back here.

mod xml;

use crate::config::AppConfig;
use crate::docbook::{DocbookDocument, DocbookExporter, ExportOptions, ExportSummary};
use crate::error::{DeliveryError, ErrorContext, Result};
use crate::model::{
    Component, Delivery, DeliveryInformation, DeliveryRegistry, Element, StrategyAssignment,
};
use crate::pipeline::{resolve_strategy, ComputationReport, ComputationSnapshot};
use crate::plugins::PluginRegistry;
use std::path::{Path, PathBuf};

/// Deliveries and components persisted together.
#[derive(Debug)]
pub struct Project {
    deliveries: DeliveryRegistry,
    root: Component,
}

impl Project {
    /// Empty project with a root component
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root(Component::new(root_name))
    }

    #[must_use]
    pub fn with_root(root: Component) -> Self {
        Self {
            deliveries: DeliveryRegistry::new(),
            root,
        }
    }

    #[must_use]
    pub const fn deliveries(&self) -> &DeliveryRegistry {
        &self.deliveries
    }

    /// Mutable access for metadata updates and listeners.
    ///
    /// Use [`Project::remove_delivery`] to remove deliveries so that their
    /// information is pruned.
    pub fn deliveries_mut(&mut self) -> &mut DeliveryRegistry {
        &mut self.deliveries
    }

    #[must_use]
    pub const fn root(&self) -> &Component {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Component {
        &mut self.root
    }

    /// Component by full name
    pub fn component(&self, full_name: &str) -> Result<&Component> {
        self.root
            .find(full_name)
            .ok_or_else(|| DeliveryError::not_found("component", full_name))
    }

    pub fn component_mut(&mut self, full_name: &str) -> Result<&mut Component> {
        self.root
            .find_mut(full_name)
            .ok_or_else(|| DeliveryError::not_found("component", full_name))
    }

    /// Register a delivery; fails if the identifier is taken
    pub fn add_delivery(&mut self, delivery: Delivery) -> Result<()> {
        let id = delivery.id().to_string();
        if self.deliveries.add(delivery) {
            tracing::info!(delivery = %id, "Delivery added");
            Ok(())
        } else {
            Err(DeliveryError::invalid_parameters(
                "delivery",
                format!("delivery '{id}' already exists"),
            ))
        }
    }

    /// Remove a delivery and every information entry recorded for it.
    ///
    /// Returns the delivery and the number of pruned entries.
    pub fn remove_delivery(&mut self, id: &str) -> Result<(Delivery, usize)> {
        let delivery = self
            .deliveries
            .remove(id)
            .ok_or_else(|| DeliveryError::not_found("delivery", id))?;
        let pruned = self.root.prune_delivery(id);
        tracing::info!(delivery = %id, pruned, "Delivery removed");
        Ok((delivery, pruned))
    }

    /// The delivery preceding `id`
    #[must_use]
    pub fn former_of(&self, id: &str) -> Option<&Delivery> {
        self.deliveries.former(id)
    }

    /// Add a component below `parent`, returning its full name
    pub fn add_component(&mut self, parent: &str, component: Component) -> Result<String> {
        let parent = self.component_mut(parent)?;
        if parent.children().iter().any(|c| c.name() == component.name()) {
            return Err(DeliveryError::invalid_parameters(
                parent.full_name(),
                format!("component '{}' already exists", component.name()),
            ));
        }
        Ok(parent.push_child(component).full_name().to_string())
    }

    /// Configure the strategy of a component for a data source.
    ///
    /// The assignment is validated before it is stored.
    pub fn assign(
        &mut self,
        registry: &PluginRegistry,
        full_name: &str,
        source: &str,
        assignment: StrategyAssignment,
    ) -> Result<()> {
        let component = self.component_mut(full_name)?;
        let previous = component.unassign(source);
        component.assign(source, assignment);
        if let Err(e) = resolve_strategy(registry, component, source) {
            component.unassign(source);
            if let Some(previous) = previous {
                component.assign(source, previous);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Store information, checking that the component, delivery and data
    /// source exist
    pub fn set_information(
        &mut self,
        registry: &PluginRegistry,
        full_name: &str,
        delivery: &str,
        info: DeliveryInformation,
    ) -> Result<()> {
        registry.import(info.source())?;
        if !self.deliveries.contains(delivery) {
            return Err(DeliveryError::not_found("delivery", delivery));
        }
        self.component_mut(full_name)?.set_information(delivery, info);
        Ok(())
    }

    /// Immutable copy for a background computation
    pub fn snapshot(&self, project_root: impl Into<PathBuf>) -> ComputationSnapshot {
        ComputationSnapshot {
            root: self.root.clone(),
            deliveries: self.deliveries.iter().cloned().collect(),
            project_root: project_root.into(),
        }
    }

    /// Apply computed results, returning the number of stored entries
    pub fn apply(&mut self, report: &ComputationReport) -> usize {
        report.apply(&mut self.root)
    }

    /// Export options for `delivery` compared to its former delivery
    pub fn export_options(&self, config: &AppConfig, delivery: &str) -> Result<ExportOptions> {
        if !self.deliveries.contains(delivery) {
            return Err(DeliveryError::not_found("delivery", delivery));
        }
        let former = self.former_of(delivery).map(|d| d.id().to_string());
        Ok(ExportOptions::from_config(config, delivery, former))
    }

    /// Export the whole tree into `document`
    pub fn export(
        &self,
        registry: &PluginRegistry,
        options: ExportOptions,
        document: &mut DocbookDocument,
    ) -> Result<ExportSummary> {
        DocbookExporter::new(registry, options).export(&self.root, document)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// The project as an XML document
    pub fn to_xml_string(&self) -> Result<String> {
        xml::project_to_element(self).to_xml_document()
    }

    /// Read a project, resolving plugin names against `registry`
    pub fn from_xml_str(content: &str, registry: &PluginRegistry) -> Result<Self> {
        let root = Element::parse(content)?;
        xml::project_from_element(&root, registry)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_xml_string()?;
        std::fs::write(path, content).map_err(|e| DeliveryError::io(path, e))?;
        tracing::debug!(path = %path.display(), "Project saved");
        Ok(())
    }

    pub fn load(path: &Path, registry: &PluginRegistry) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeliveryError::io(path, e))?;
        Self::from_xml_str(&content, registry).with_context(|| format!("loading {}", path.display()))
    }
}
