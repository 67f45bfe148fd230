//! Background computation of delivery information.
//!
//! A job works on a snapshot of the tree. Results come back as a
//! [`ComputationReport`] that the foreground applies to its own tree, so
//! the owned tree is never mutated off-thread.

use super::dispatch::{compute_information, resolve_strategy, ComputeContext};
use crate::config::AppConfig;
use crate::error::{DeliveryError, Result};
use crate::model::{Component, Delivery, DeliveryInformation};
use crate::plugins::PluginRegistry;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Immutable input of a computation.
#[derive(Debug, Clone)]
pub struct ComputationSnapshot {
    pub root: Component,
    /// Every delivery of the project, in delivery order
    pub deliveries: Vec<Delivery>,
    /// Directory relative paths in assignments resolve against
    pub project_root: PathBuf,
}

/// What to compute.
///
/// Empty lists select the latest delivery and every registered source; no
/// component selects the whole tree.
#[derive(Debug, Clone, Default)]
pub struct ComputationPlan {
    pub deliveries: Vec<String>,
    pub sources: Vec<String>,
    pub component: Option<String>,
}

/// Information computed for one component.
#[derive(Debug, Clone)]
pub struct ComputedInformation {
    pub component: String,
    pub delivery: String,
    pub information: DeliveryInformation,
}

/// A computation that produced no information.
#[derive(Debug)]
pub struct ComputationFailure {
    pub component: String,
    pub delivery: String,
    pub source: String,
    pub error: DeliveryError,
}

/// Outcome of a computation job.
#[derive(Debug, Default)]
pub struct ComputationReport {
    pub computed: Vec<ComputedInformation>,
    pub failures: Vec<ComputationFailure>,
}

impl ComputationReport {
    /// Store computed information in `root`, returning how many entries
    /// were written
    pub fn apply(&self, root: &mut Component) -> usize {
        let mut applied = 0;
        for item in &self.computed {
            match root.find_mut(&item.component) {
                Some(component) => {
                    component.set_information(&item.delivery, item.information.clone());
                    applied += 1;
                }
                None => tracing::warn!(
                    component = %item.component,
                    "Component vanished before results were applied"
                ),
            }
        }
        applied
    }

    /// Fatal failures the foreground has to surface
    pub fn runtime_failures(&self) -> impl Iterator<Item = &ComputationFailure> {
        self.failures.iter().filter(|f| !f.error.is_recoverable())
    }

    /// Computations refused because of their configuration
    pub fn rejected(&self) -> impl Iterator<Item = &ComputationFailure> {
        self.failures.iter().filter(|f| f.error.is_recoverable())
    }

    /// Computed entries holding inline error content
    #[must_use]
    pub fn error_content_count(&self) -> usize {
        self.computed
            .iter()
            .filter(|c| c.information.error_message().is_some())
            .count()
    }
}

/// Handle of a computation running on a worker thread.
#[derive(Debug)]
pub struct ComputationJob {
    handle: JoinHandle<Result<ComputationReport>>,
}

impl ComputationJob {
    /// Start computing `plan` over `snapshot` in the background
    pub fn spawn(
        snapshot: ComputationSnapshot,
        plan: ComputationPlan,
        registry: Arc<PluginRegistry>,
        config: Arc<AppConfig>,
    ) -> Result<Self> {
        let handle = std::thread::Builder::new()
            .name("delivery-compute".to_string())
            .spawn(move || run(&snapshot, &plan, &registry, &config))
            .map_err(|e| DeliveryError::runtime(format!("failed to start computation thread: {e}")))?;
        Ok(Self { handle })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job and return its report
    pub fn join(self) -> Result<ComputationReport> {
        self.handle
            .join()
            .map_err(|_| DeliveryError::runtime("computation thread panicked"))?
    }
}

/// Compute `plan` synchronously.
///
/// Components whose strategy aggregates sub-component information are
/// computed after all others, children before parents, and see the
/// results computed earlier in the same run.
pub fn run(
    snapshot: &ComputationSnapshot,
    plan: &ComputationPlan,
    registry: &PluginRegistry,
    config: &AppConfig,
) -> Result<ComputationReport> {
    let deliveries = select_deliveries(snapshot, plan)?;
    let sources = select_sources(registry, plan)?;
    let scope = plan
        .component
        .clone()
        .unwrap_or_else(|| snapshot.root.full_name().to_string());
    if snapshot.root.find(&scope).is_none() {
        return Err(DeliveryError::not_found("component", scope));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.computation.threads.unwrap_or(0))
        .thread_name(|i| format!("delivery-worker-{i}"))
        .build()
        .map_err(|e| DeliveryError::runtime(format!("failed to build worker pool: {e}")))?;

    let ctx = ComputeContext {
        registry,
        config,
        project_root: &snapshot.project_root,
    };
    let mut working = snapshot.root.clone();
    let mut report = ComputationReport::default();

    for delivery in deliveries {
        let former = former_of(&snapshot.deliveries, delivery);
        for source in &sources {
            tracing::info!(delivery = %delivery.id(), source = %source, scope = %scope, "Computing");

            let (direct, aggregating) = partition_targets(&working, &scope, registry, source);

            let outcomes: Vec<(String, Result<DeliveryInformation>)> = pool.install(|| {
                direct
                    .par_iter()
                    .filter_map(|name| working.find(name))
                    .map(|component| {
                        (
                            component.full_name().to_string(),
                            compute_information(&ctx, component, delivery, former, source),
                        )
                    })
                    .collect()
            });
            for (name, outcome) in outcomes {
                record(&mut report, &mut working, name, delivery, source, outcome);
            }

            for name in aggregating {
                let Some(component) = working.find(&name) else {
                    continue;
                };
                let outcome = compute_information(&ctx, component, delivery, former, source);
                record(&mut report, &mut working, name, delivery, source, outcome);
            }
        }
    }

    tracing::info!(
        computed = report.computed.len(),
        failures = report.failures.len(),
        "Computation finished"
    );
    Ok(report)
}

fn select_deliveries<'a>(
    snapshot: &'a ComputationSnapshot,
    plan: &ComputationPlan,
) -> Result<Vec<&'a Delivery>> {
    if plan.deliveries.is_empty() {
        return snapshot
            .deliveries
            .last()
            .map(|d| vec![d])
            .ok_or_else(|| DeliveryError::not_found("delivery", "<latest>"));
    }
    plan.deliveries
        .iter()
        .map(|id| {
            snapshot
                .deliveries
                .iter()
                .find(|d| d.id() == id)
                .ok_or_else(|| DeliveryError::not_found("delivery", id.as_str()))
        })
        .collect()
}

fn select_sources(registry: &PluginRegistry, plan: &ComputationPlan) -> Result<Vec<String>> {
    if plan.sources.is_empty() {
        return Ok(registry.imports().map(|i| i.name.clone()).collect());
    }
    for source in &plan.sources {
        registry.import(source)?;
    }
    Ok(plan.sources.clone())
}

fn former_of<'a>(deliveries: &'a [Delivery], delivery: &Delivery) -> Option<&'a Delivery> {
    deliveries.iter().take_while(|d| *d != delivery).last()
}

/// Full names in scope split into directly computed and aggregating
/// components; aggregating ones come in post-order.
fn partition_targets(
    root: &Component,
    scope: &str,
    registry: &PluginRegistry,
    source: &str,
) -> (Vec<String>, Vec<String>) {
    let mut ordered = Vec::new();
    if let Some(scope) = root.find(scope) {
        post_order(scope, &mut ordered);
    }
    let (aggregating, direct): (Vec<&Component>, Vec<&Component>) =
        ordered.into_iter().partition(|c| {
            resolve_strategy(registry, c, source).is_ok_and(|(strategy, _)| strategy.aggregates())
        });
    let names = |list: Vec<&Component>| -> Vec<String> {
        list.into_iter().map(|c| c.full_name().to_string()).collect()
    };
    (names(direct), names(aggregating))
}

fn post_order<'a>(component: &'a Component, out: &mut Vec<&'a Component>) {
    for child in component.children() {
        post_order(child, out);
    }
    out.push(component);
}

fn record(
    report: &mut ComputationReport,
    working: &mut Component,
    component: String,
    delivery: &Delivery,
    source: &str,
    outcome: Result<DeliveryInformation>,
) {
    match outcome {
        Ok(information) => {
            if let Some(node) = working.find_mut(&component) {
                node.set_information(delivery.id(), information.clone());
            }
            report.computed.push(ComputedInformation {
                component,
                delivery: delivery.id().to_string(),
                information,
            });
        }
        Err(error) => {
            if error.is_recoverable() {
                tracing::warn!(component = %component, source, error = %error, "Computation rejected");
            } else {
                tracing::error!(component = %component, source, error = %error, "Computation failed");
            }
            report.failures.push(ComputationFailure {
                component,
                delivery: delivery.id().to_string(),
                source: source.to_string(),
                error,
            });
        }
    }
}
