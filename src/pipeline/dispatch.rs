//! Resolution and execution of a component's assignment for one source.

use crate::config::AppConfig;
use crate::error::{DeliveryError, ErrorContext, Result};
use crate::model::{error_content, Component, Delivery, DeliveryInformation};
use crate::plugins::PluginRegistry;
use crate::strategy::{check_parameters, AssignmentStrategy, ComputeRequest, IGNORE_STRATEGY};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

/// Shared, read-only inputs of every computation.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext<'a> {
    pub registry: &'a PluginRegistry,
    pub config: &'a AppConfig,
    pub project_root: &'a Path,
}

/// The strategy a component uses for a source, with its parameters.
///
/// A component without an assignment uses the `ignore` strategy. The
/// strategy must exist, be accepted by the source and receive the number
/// of parameters it expects.
pub fn resolve_strategy(
    registry: &PluginRegistry,
    component: &Component,
    source: &str,
) -> Result<(Arc<dyn AssignmentStrategy>, Vec<String>)> {
    let import = registry.import(source)?;
    let (name, parameters) = component.assignment(source).map_or_else(
        || (IGNORE_STRATEGY.to_string(), Vec::new()),
        |a| (a.strategy.clone(), a.parameters.clone()),
    );
    let strategy = registry.strategy(&name)?;
    if name != IGNORE_STRATEGY && !import.accepts(&name) {
        return Err(DeliveryError::invalid_parameters(
            component.full_name(),
            format!("data source '{source}' does not accept strategy '{name}'"),
        ));
    }
    check_parameters(strategy.as_ref(), &parameters)
        .with_context(|| format!("{}/{source}", component.full_name()))?;
    Ok((strategy, parameters))
}

/// Compute the information of `component` for one delivery and source.
///
/// Returns `Err` for configuration problems (unknown or unaccepted
/// strategy, wrong parameter count) and for fatal failures
/// ([`DeliveryError::InternalRuntime`], including a panicking strategy).
/// Any other failure inside the strategy becomes inline error content.
pub fn compute_information(
    ctx: &ComputeContext<'_>,
    component: &Component,
    delivery: &Delivery,
    former: Option<&Delivery>,
    source: &str,
) -> Result<DeliveryInformation> {
    let (strategy, parameters) = resolve_strategy(ctx.registry, component, source)?;
    let import = ctx.registry.import(source)?;
    let request = ComputeRequest {
        parameters: &parameters,
        component,
        delivery,
        former,
        import,
        project_root: ctx.project_root,
        settings: ctx.config.plugin_settings(source),
        registry: ctx.registry,
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| strategy.compute(&request)));
    let content = match outcome {
        Ok(Ok(content)) => content,
        Ok(Err(e)) if e.is_recoverable() => {
            tracing::warn!(
                component = %component.full_name(),
                delivery = %delivery.id(),
                source,
                strategy = strategy.name(),
                error = %e,
                "Computation failed, storing error content"
            );
            error_content(e.to_string())
        }
        Ok(Err(e)) => return Err(e),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            return Err(DeliveryError::runtime(format!(
                "strategy '{}' panicked for {} ({}): {message}",
                strategy.name(),
                component.full_name(),
                delivery.id()
            )));
        }
    };

    let mut info = DeliveryInformation::with_content(source, import.kind, content);
    if let Some(former) = former {
        let previous = component.information(former.id(), source);
        info.is_new = !info.is_empty() && (previous.is_empty() || info.differs_from(previous));
    } else {
        info.is_new = !info.is_empty();
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, InformationKind, StrategyAssignment};
    use crate::strategy::Arity;

    struct Exploding;

    impl AssignmentStrategy for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }
        fn arity(&self) -> Arity {
            Arity::Exactly(0)
        }
        fn usage(&self) -> &str {
            ""
        }
        fn compute(&self, _request: &ComputeRequest<'_>) -> Result<Element> {
            panic!("boom")
        }
    }

    fn registry() -> PluginRegistry {
        let mut builder = PluginRegistry::builder();
        builder.register_builtins();
        builder.register_strategy(Arc::new(Exploding));
        builder.register_import(
            crate::plugins::ImportStrategy::new("fragile", InformationKind::Text)
                .accepting(["exploding", "text"]),
        );
        builder.build()
    }

    fn compute(component: &Component, source: &str) -> Result<DeliveryInformation> {
        let registry = registry();
        let config = AppConfig::default();
        let ctx = ComputeContext {
            registry: &registry,
            config: &config,
            project_root: Path::new("."),
        };
        compute_information(&ctx, component, &Delivery::new("1.0"), None, source)
    }

    #[test]
    fn test_unassigned_source_uses_ignore() {
        let info = compute(&Component::new("app"), "version").unwrap();
        assert!(info.is_empty());
        assert!(!info.is_new);
    }

    #[test]
    fn test_wrong_parameter_count_is_rejected() {
        let mut component = Component::new("app");
        component.assign("version", StrategyAssignment::new("text", Vec::<String>::new()));
        let err = compute(&component, "version").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidParameters { .. }));
    }

    #[test]
    fn test_unaccepted_strategy_is_rejected() {
        let mut component = Component::new("app");
        component.assign("commits", StrategyAssignment::new("text", ["x"]));
        assert!(matches!(
            compute(&component, "commits"),
            Err(DeliveryError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_unknown_strategy_is_not_found() {
        let mut component = Component::new("app");
        component.assign("version", StrategyAssignment::new("svn", ["x"]));
        assert!(matches!(
            compute(&component, "version"),
            Err(DeliveryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_recoverable_failure_becomes_error_content() {
        let mut component = Component::new("app");
        component.assign("version", StrategyAssignment::new("file", ["does/not/exist", ""]));
        let info = compute(&component, "version").unwrap();
        assert!(info.error_message().is_some());
        assert!(!info.is_empty());
    }

    #[test]
    fn test_panic_becomes_runtime_failure() {
        let mut component = Component::new("app");
        component.assign("fragile", StrategyAssignment::new("exploding", Vec::<String>::new()));
        let err = compute(&component, "fragile").unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("boom"));
    }
}
