//! Component tree model.

use super::information::{DeliveryInformation, InformationKind};
use crate::error::{DeliveryError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Returned by lookups that find no information.
static EMPTY_INFORMATION: LazyLock<DeliveryInformation> =
    LazyLock::new(|| DeliveryInformation::empty("", InformationKind::Text));

/// Composite key of the information map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfoKey {
    pub delivery: String,
    pub source: String,
}

impl InfoKey {
    pub fn new(delivery: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            delivery: delivery.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for InfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.delivery, self.source)
    }
}

/// The assignment strategy configured for one data source of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAssignment {
    pub strategy: String,
    pub parameters: Vec<String>,
}

impl StrategyAssignment {
    pub fn new<I, S>(strategy: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strategy: strategy.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }
}

/// A node in the component hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    name: String,
    full_name: String,
    /// Included in customer-facing documents
    pub customer_relevant: bool,
    children: Vec<Component>,
    information: IndexMap<InfoKey, DeliveryInformation>,
    assignments: BTreeMap<String, StrategyAssignment>,
}

impl Component {
    /// Create a detached component (its full name is its name)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            customer_relevant: true,
            children: Vec::new(),
            information: IndexMap::new(),
            assignments: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn with_customer_relevant(mut self, relevant: bool) -> Self {
        self.customer_relevant = relevant;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.push_child(child);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the root, e.g. `product.core.parser`
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    #[must_use]
    pub fn has_sub_components(&self) -> bool {
        !self.children.is_empty()
    }

    /// Append a child and return it
    pub fn push_child(&mut self, mut child: Self) -> &mut Self {
        child.reparent(&self.full_name);
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Insert a child at `index` (0..=len)
    pub fn insert_child(&mut self, index: usize, mut child: Self) -> Result<()> {
        if index > self.children.len() {
            return Err(DeliveryError::invalid_parameters(
                &self.full_name,
                format!("child index {index} out of range 0..={}", self.children.len()),
            ));
        }
        child.reparent(&self.full_name);
        self.children.insert(index, child);
        Ok(())
    }

    /// Remove and return the child at `index`
    pub fn remove_child(&mut self, index: usize) -> Result<Self> {
        if index >= self.children.len() {
            return Err(DeliveryError::invalid_parameters(
                &self.full_name,
                format!("no child at index {index}"),
            ));
        }
        let mut child = self.children.remove(index);
        child.reparent("");
        Ok(child)
    }

    fn reparent(&mut self, parent_full_name: &str) {
        self.full_name = if parent_full_name.is_empty() {
            self.name.clone()
        } else {
            format!("{parent_full_name}.{}", self.name)
        };
        let prefix = self.full_name.clone();
        for child in &mut self.children {
            child.reparent(&prefix);
        }
    }

    /// Find a component in this subtree (including self) by full name
    #[must_use]
    pub fn find(&self, full_name: &str) -> Option<&Self> {
        if self.full_name == full_name {
            return Some(self);
        }
        if !full_name.starts_with(&self.full_name) {
            return None;
        }
        self.children.iter().find_map(|c| c.find(full_name))
    }

    /// Mutable variant of [`Component::find`]
    pub fn find_mut(&mut self, full_name: &str) -> Option<&mut Self> {
        if self.full_name == full_name {
            return Some(self);
        }
        if !full_name.starts_with(&self.full_name) {
            return None;
        }
        self.children.iter_mut().find_map(|c| c.find_mut(full_name))
    }

    /// All descendants in pre-order (self excluded)
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    // ------------------------------------------------------------------
    // Information
    // ------------------------------------------------------------------

    /// Information for a delivery and data source; an empty sentinel if absent
    #[must_use]
    pub fn information(&self, delivery: &str, source: &str) -> &DeliveryInformation {
        self.find_information(delivery, source)
            .unwrap_or(&EMPTY_INFORMATION)
    }

    /// Information for a delivery and data source, if stored
    #[must_use]
    pub fn find_information(&self, delivery: &str, source: &str) -> Option<&DeliveryInformation> {
        self.information.get(&InfoKey::new(delivery, source))
    }

    /// Store information, replacing any previous value for the key
    pub fn set_information(&mut self, delivery: &str, info: DeliveryInformation) {
        let key = InfoKey::new(delivery, info.source());
        self.information.insert(key, info);
    }

    /// Accumulate information into the existing entry (or store it)
    pub fn add_information(&mut self, delivery: &str, info: DeliveryInformation) {
        let key = InfoKey::new(delivery, info.source());
        match self.information.get_mut(&key) {
            Some(existing) => existing.add_information(&info),
            None => {
                self.information.insert(key, info);
            }
        }
    }

    /// Drop information for a key
    pub fn remove_information(&mut self, delivery: &str, source: &str) -> Option<DeliveryInformation> {
        self.information.shift_remove(&InfoKey::new(delivery, source))
    }

    /// Stored information entries in insertion order
    pub fn information_entries(&self) -> impl Iterator<Item = (&InfoKey, &DeliveryInformation)> {
        self.information.iter()
    }

    /// Remove every entry keyed by `delivery` in this subtree.
    ///
    /// Returns the number of entries removed.
    pub fn prune_delivery(&mut self, delivery: &str) -> usize {
        let before = self.information.len();
        self.information.retain(|key, _| key.delivery != delivery);
        let mut removed = before - self.information.len();
        for child in &mut self.children {
            removed += child.prune_delivery(delivery);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Strategy assignments
    // ------------------------------------------------------------------

    /// The strategy configured for a data source
    #[must_use]
    pub fn assignment(&self, source: &str) -> Option<&StrategyAssignment> {
        self.assignments.get(source)
    }

    /// Configure the strategy for a data source
    pub fn assign(&mut self, source: impl Into<String>, assignment: StrategyAssignment) {
        self.assignments.insert(source.into(), assignment);
    }

    /// Remove the strategy configured for a data source
    pub fn unassign(&mut self, source: &str) -> Option<StrategyAssignment> {
        self.assignments.remove(source)
    }

    /// Configured assignments, sorted by data source name
    pub fn assignments(&self) -> impl Iterator<Item = (&String, &StrategyAssignment)> {
        self.assignments.iter()
    }
}
