//! Project editing commands: init, deliveries, components, assignments and
//! the plugin listing.

use super::ProjectPaths;
use crate::config::AppConfig;
use crate::model::{Component, Delivery, StrategyAssignment};
use crate::plugins::PluginRegistry;
use crate::project::Project;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Create an empty project file with a root component
pub fn run_init(paths: &ProjectPaths, root_name: &str, force: bool) -> Result<()> {
    if paths.project_file.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            paths.project_file.display()
        );
    }
    let project = Project::new(root_name);
    paths.save(&project)?;
    eprintln!("Created {}", paths.project_file.display());
    Ok(())
}

pub fn run_delivery_add(
    paths: &ProjectPaths,
    registry: &PluginRegistry,
    id: &str,
    integrator: Option<String>,
    date: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut project = paths.load(registry)?;
    let delivery = Delivery::with_details(
        id,
        integrator.unwrap_or_default(),
        date.unwrap_or_else(Utc::now),
    );
    project.add_delivery(delivery)?;
    paths.save(&project)
}

pub fn run_delivery_remove(paths: &ProjectPaths, registry: &PluginRegistry, id: &str) -> Result<()> {
    let mut project = paths.load(registry)?;
    let (_, pruned) = project.remove_delivery(id)?;
    paths.save(&project)?;
    eprintln!("Removed delivery {id} ({pruned} information entries)");
    Ok(())
}

/// Print deliveries oldest first, as text or JSON
pub fn run_delivery_list(paths: &ProjectPaths, registry: &PluginRegistry, json: bool) -> Result<()> {
    let project = paths.load(registry)?;
    let deliveries: Vec<&Delivery> = project.deliveries().iter().collect();
    if json {
        let out = serde_json::to_string_pretty(&deliveries).context("failed to serialize deliveries")?;
        println!("{out}");
        return Ok(());
    }
    let mut out = String::new();
    for delivery in deliveries {
        let _ = writeln!(
            out,
            "{:<16} {}  {}",
            delivery.id(),
            delivery.created.format("%Y-%m-%d %H:%M"),
            delivery.integrator
        );
    }
    print!("{out}");
    Ok(())
}

pub fn run_component_add(
    paths: &ProjectPaths,
    registry: &PluginRegistry,
    parent: &str,
    name: &str,
    internal: bool,
) -> Result<()> {
    if name.is_empty() || name.contains('.') {
        bail!("invalid component name '{name}': must be non-empty and contain no '.'");
    }
    let mut project = paths.load(registry)?;
    let component = Component::new(name).with_customer_relevant(!internal);
    let full_name = project.add_component(parent, component)?;
    paths.save(&project)?;
    eprintln!("Added component {full_name}");
    Ok(())
}

pub fn run_assign(
    paths: &ProjectPaths,
    registry: &PluginRegistry,
    component: &str,
    source: &str,
    strategy: &str,
    parameters: Vec<String>,
) -> Result<()> {
    let mut project = paths.load(registry)?;
    project
        .assign(registry, component, source, StrategyAssignment::new(strategy, parameters))
        .with_context(|| format!("cannot assign '{strategy}' to {component}/{source}"))?;
    paths.save(&project)
}

/// Describe every data source and assignment strategy
pub fn run_plugins(registry: &PluginRegistry, config: &AppConfig) -> Result<()> {
    print!("{}", plugin_listing(registry, config));
    Ok(())
}

/// Data sources in the configured view order, then strategies by name
fn plugin_listing(registry: &PluginRegistry, config: &AppConfig) -> String {
    let mut out = String::from("Data sources:\n");
    for import in registry.imports_in_order(&config.view_order) {
        let _ = writeln!(
            out,
            "  {:<10} {:<8} accepts: {}",
            import.name,
            import.kind.name(),
            import.strategies.join(", ")
        );
    }
    out.push_str("\nAssignment strategies:\n");
    let mut strategies: Vec<_> = registry.strategies().collect();
    strategies.sort_by(|a, b| a.name().cmp(b.name()));
    for strategy in strategies {
        let _ = writeln!(
            out,
            "  {:<12} {:<12} {}",
            strategy.name(),
            strategy.arity().to_string(),
            strategy.usage()
        );
    }
    out
}
