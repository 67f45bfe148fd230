//! Compute command handler.

use super::ProjectPaths;
use crate::config::AppConfig;
use crate::pipeline::{exit_codes, ComputationJob, ComputationPlan, ComputationReport};
use crate::plugins::PluginRegistry;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Compute delivery information in the background, then store it.
///
/// Returns the process exit code.
pub fn run_compute(
    paths: &ProjectPaths,
    registry: Arc<PluginRegistry>,
    config: Arc<AppConfig>,
    plan: ComputationPlan,
) -> Result<i32> {
    let mut project = paths.load(&registry)?;
    let snapshot = project.snapshot(paths.project_root.clone());

    let started = Instant::now();
    let job = ComputationJob::spawn(snapshot, plan, registry, config)?;
    while !job.is_finished() {
        std::thread::sleep(Duration::from_millis(50));
    }
    let report = job.join()?;
    tracing::info!(
        computed = report.computed.len(),
        failures = report.failures.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "Computation finished"
    );

    let applied = project.apply(&report);
    paths.save(&project)?;
    eprintln!("Stored {applied} information entries");

    print_failures(&report);
    Ok(exit_code(&report))
}

fn print_failures(report: &ComputationReport) {
    for failure in report.runtime_failures() {
        eprintln!(
            "FATAL {} {} {}: {}",
            failure.component, failure.delivery, failure.source, failure.error
        );
    }
    for failure in report.rejected() {
        eprintln!(
            "rejected {} {} {}: {}",
            failure.component, failure.delivery, failure.source, failure.error
        );
    }
}

fn exit_code(report: &ComputationReport) -> i32 {
    if report.runtime_failures().next().is_some() {
        exit_codes::RUNTIME_FAILURE
    } else if report.rejected().next().is_some() || report.error_content_count() > 0 {
        exit_codes::COMPUTATION_ERRORS
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{run_assign, run_component_add, run_delivery_add, run_init, PROJECT_FILE};

    #[test]
    fn test_compute_stores_information() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path().join(PROJECT_FILE), None);
        let registry = Arc::new(PluginRegistry::with_builtins());
        run_init(&paths, "product", false).unwrap();
        run_delivery_add(&paths, &registry, "1.0", None, None).unwrap();
        run_component_add(&paths, &registry, "product", "core", false).unwrap();
        run_assign(&paths, &registry, "product.core", "version", "text", vec!["1.0.3".to_string()])
            .unwrap();

        let code = run_compute(
            &paths,
            Arc::clone(&registry),
            Arc::new(AppConfig::default()),
            ComputationPlan::default(),
        )
        .unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let project = paths.load(&registry).unwrap();
        let core = project.component("product.core").unwrap();
        assert_eq!(core.information("1.0", "version").text(), "1.0.3");
    }

    #[test]
    fn test_error_content_sets_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path().join(PROJECT_FILE), None);
        let registry = Arc::new(PluginRegistry::with_builtins());
        run_init(&paths, "product", false).unwrap();
        run_delivery_add(&paths, &registry, "1.0", None, None).unwrap();
        run_assign(
            &paths,
            &registry,
            "product",
            "notes",
            "file",
            vec!["missing.txt".to_string(), String::new()],
        )
        .unwrap();

        let code = run_compute(
            &paths,
            Arc::clone(&registry),
            Arc::new(AppConfig::default()),
            ComputationPlan::default(),
        )
        .unwrap();
        assert_eq!(code, exit_codes::COMPUTATION_ERRORS);
    }
}
