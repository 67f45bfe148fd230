//! Export command handler.

use super::ProjectPaths;
use crate::config::AppConfig;
use crate::docbook::DocbookDocument;
use crate::plugins::PluginRegistry;
use anyhow::{Context, Result};
use std::path::Path;

/// Write the DocBook document for `delivery` (the latest one by default).
///
/// With `merge`, an existing document at `output` is extended instead of
/// replaced.
pub fn run_export(
    paths: &ProjectPaths,
    registry: &PluginRegistry,
    config: &AppConfig,
    delivery: Option<&str>,
    output: &Path,
    merge: bool,
) -> Result<()> {
    let project = paths.load(registry)?;
    let delivery = match delivery {
        Some(id) => id.to_string(),
        None => project
            .deliveries()
            .latest()
            .map(|d| d.id().to_string())
            .context("the project has no deliveries to export")?,
    };

    let mut document = if merge {
        DocbookDocument::load_or_new(output, &config.export.title)?
    } else {
        DocbookDocument::new(&config.export.title)
    };
    let options = project.export_options(config, &delivery)?;
    let summary = project.export(registry, options, &mut document)?;
    document
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    eprintln!(
        "Exported delivery {delivery} to {} ({} sections, {} rows)",
        output.display(),
        summary.sections.len(),
        summary.rows
    );
    if !summary.skipped.is_empty() {
        eprintln!("No information for: {}", summary.skipped.join(", "));
    }
    Ok(())
}
