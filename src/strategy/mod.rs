//! Assignment strategies: computations producing a data source's content
//! for one component and delivery.
//!
//! Strategies run off the foreground thread. They must not touch any
//! presentation resource and report failure through `Result`; the dispatch
//! layer turns recoverable errors into inline error content.

mod builtin;
mod subtree;
mod vcs;

pub use builtin::{CommandStrategy, FileStrategy, IgnoreStrategy, RandomStrategy, TextStrategy};
pub use subtree::SubtreeStrategy;
pub use vcs::{VcsCommitsStrategy, VcsTagStrategy};

use crate::config::PluginSettings;
use crate::error::{DeliveryError, Result};
use crate::model::{Component, Delivery, Element};
use crate::plugins::{ImportStrategy, PluginRegistry, PluginRegistryBuilder};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Name of the fallback strategy used when nothing is configured.
pub const IGNORE_STRATEGY: &str = "ignore";

/// Number of parameters a strategy expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Everything a strategy may consult while computing.
pub struct ComputeRequest<'a> {
    pub parameters: &'a [String],
    pub component: &'a Component,
    pub delivery: &'a Delivery,
    /// Delivery preceding `delivery`, bounds incremental queries
    pub former: Option<&'a Delivery>,
    pub import: &'a ImportStrategy,
    pub project_root: &'a Path,
    /// Settings configured for the data source
    pub settings: &'a PluginSettings,
    pub registry: &'a PluginRegistry,
}

impl ComputeRequest<'_> {
    /// Parameter at `index`; dispatch has already validated the count
    #[must_use]
    pub fn parameter(&self, index: usize) -> &str {
        self.parameters.get(index).map_or("", String::as_str)
    }
}

/// A named computation producing structured content.
pub trait AssignmentStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    /// One-line description of the parameters
    fn usage(&self) -> &str;

    /// Whether the strategy reads information of sub-components, which
    /// must therefore be computed first
    fn aggregates(&self) -> bool {
        false
    }

    /// Produce `<content>` for the request
    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element>;
}

/// Reject a parameter list whose length the strategy does not accept.
pub fn check_parameters(strategy: &dyn AssignmentStrategy, parameters: &[String]) -> Result<()> {
    if strategy.arity().accepts(parameters.len()) {
        Ok(())
    } else {
        Err(DeliveryError::invalid_parameters(
            strategy.name(),
            format!(
                "expected {} parameter(s), got {} (usage: {})",
                strategy.arity(),
                parameters.len(),
                strategy.usage()
            ),
        ))
    }
}

/// Register the built-in strategies.
pub fn register(builder: &mut PluginRegistryBuilder) {
    builder
        .register_strategy(Arc::new(IgnoreStrategy))
        .register_strategy(Arc::new(TextStrategy))
        .register_strategy(Arc::new(FileStrategy))
        .register_strategy(Arc::new(CommandStrategy))
        .register_strategy(Arc::new(RandomStrategy))
        .register_strategy(Arc::new(SubtreeStrategy))
        .register_strategy(Arc::new(VcsCommitsStrategy))
        .register_strategy(Arc::new(VcsTagStrategy));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(1));
        assert!(Arity::AtLeast(1).accepts(3));
        assert!(!Arity::AtLeast(1).accepts(0));
    }

    #[test]
    fn test_check_parameters_reports_usage() {
        let err = check_parameters(&TextStrategy, &[]).unwrap_err();
        match err {
            DeliveryError::InvalidParameters { target, message } => {
                assert_eq!(target, "text");
                assert!(message.contains("exactly 1"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(check_parameters(&TextStrategy, &["1.0".to_string()]).is_ok());
    }
}
