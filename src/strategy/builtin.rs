//! Strategies that need nothing beyond the project directory.

use super::{Arity, AssignmentStrategy, ComputeRequest};
use crate::error::{DeliveryError, Result};
use crate::model::{string_content, Element, CONTENT_TAG};
use regex::Regex;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use xxhash_rust::xxh3::xxh3_64;

/// Produces no content.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreStrategy;

impl AssignmentStrategy for IgnoreStrategy {
    fn name(&self) -> &str {
        super::IGNORE_STRATEGY
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn usage(&self) -> &str {
        "no parameters"
    }

    fn compute(&self, _request: &ComputeRequest<'_>) -> Result<Element> {
        Ok(Element::new(CONTENT_TAG))
    }
}

/// A constant value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextStrategy;

impl AssignmentStrategy for TextStrategy {
    fn name(&self) -> &str {
        "text"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &str {
        "<value>"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        Ok(string_content(request.parameter(0)))
    }
}

/// A value read from a file of the project.
///
/// The first parameter is a path relative to the project root, the second a
/// regular expression whose first capture group (or whole match) is the
/// value. An empty expression takes the whole trimmed file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStrategy;

impl AssignmentStrategy for FileStrategy {
    fn name(&self) -> &str {
        "file"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn usage(&self) -> &str {
        "<relative path> <pattern>"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let path = request.project_root.join(request.parameter(0));
        let text = std::fs::read_to_string(&path).map_err(|e| DeliveryError::io(&path, e))?;
        let pattern = request.parameter(1);
        if pattern.is_empty() {
            return Ok(string_content(text.trim()));
        }

        let regex = Regex::new(pattern)
            .map_err(|e| DeliveryError::invalid_parameters(self.name(), e.to_string()))?;
        let captures = regex.captures(&text).ok_or_else(|| {
            DeliveryError::internal(format!("pattern `{pattern}` not found in {}", path.display()))
        })?;
        let value = captures
            .get(1)
            .or_else(|| captures.get(0))
            .map_or("", |m| m.as_str());
        Ok(string_content(value.trim()))
    }
}

/// Standard output of a program run in the project root.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandStrategy;

impl AssignmentStrategy for CommandStrategy {
    fn name(&self) -> &str {
        "command"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn usage(&self) -> &str {
        "<program> [arguments...]"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let (program, args) = request
            .parameters
            .split_first()
            .ok_or_else(|| DeliveryError::invalid_parameters(self.name(), "missing program"))?;
        tracing::debug!(program = %program, ?args, "Running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(request.project_root)
            .output()
            .map_err(|e| DeliveryError::internal(format!("failed to run `{program}`: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeliveryError::internal(format!(
                "`{program}` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(string_content(String::from_utf8_lossy(&output.stdout).trim()))
    }
}

/// A pseudo-random version label, useful for exercising exports.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStrategy;

impl AssignmentStrategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn usage(&self) -> &str {
        "no parameters"
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let seed = format!(
            "{}/{}/{nanos}",
            request.component.full_name(),
            request.delivery.id()
        );
        Ok(string_content(random_version(xxh3_64(seed.as_bytes()))))
    }
}

fn random_version(hash: u64) -> String {
    format!("{}.{}.{}", hash % 10, (hash >> 8) % 100, (hash >> 16) % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginSettings;
    use crate::model::{Component, Delivery, DeliveryInformation, InformationKind};
    use crate::plugins::PluginRegistry;
    use std::path::Path;

    fn run(strategy: &dyn AssignmentStrategy, root: &Path, params: &[&str]) -> Result<Element> {
        let registry = PluginRegistry::with_builtins();
        let component = Component::new("app");
        let delivery = Delivery::new("1.0");
        let settings = PluginSettings::default();
        let parameters: Vec<String> = params.iter().map(|p| (*p).to_string()).collect();
        let request = ComputeRequest {
            parameters: &parameters,
            component: &component,
            delivery: &delivery,
            former: None,
            import: registry.import("version")?,
            project_root: root,
            settings: &settings,
            registry: &registry,
        };
        strategy.compute(&request)
    }

    fn text_of(content: Element) -> String {
        DeliveryInformation::with_content("version", InformationKind::Version, content).text()
    }

    #[test]
    fn test_ignore_is_empty() {
        let content = run(&IgnoreStrategy, Path::new("."), &[]).unwrap();
        assert!(content.children.is_empty());
    }

    #[test]
    fn test_text_constant() {
        let content = run(&TextStrategy, Path::new("."), &["2.4.1"]).unwrap();
        assert_eq!(text_of(content), "2.4.1");
    }

    #[test]
    fn test_file_with_capture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION.txt"), "name = app\nversion = 3.1.4\n").unwrap();
        let content = run(&FileStrategy, dir.path(), &["VERSION.txt", r"version = (\S+)"]).unwrap();
        assert_eq!(text_of(content), "3.1.4");

        let whole = run(&FileStrategy, dir.path(), &["VERSION.txt", ""]).unwrap();
        assert!(text_of(whole).starts_with("name = app"));
    }

    #[test]
    fn test_file_missing_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&FileStrategy, dir.path(), &["absent", "x"]).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_file_pattern_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f"), "nothing here").unwrap();
        assert!(run(&FileStrategy, dir.path(), &["f", r"version=(\d+)"]).is_err());
    }

    #[test]
    fn test_random_version_shape() {
        let version = random_version(0x1234_5678_9abc_def0);
        assert_eq!(version.split('.').count(), 3);
        assert!(semver::Version::parse(&version).is_ok());
    }
}
