use super::{Arity, AssignmentStrategy, ComputeRequest};
use crate::error::Result;
use crate::model::{Commit, Element, InformationKind, CONTENT_TAG, STRING_TAG};
use std::collections::HashSet;

/// Aggregates the information of direct sub-components.
///
/// Commits are merged (deduplicated by hash, newest first). Versions are
/// listed as `name value` lines, text is concatenated in child order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubtreeStrategy;

impl AssignmentStrategy for SubtreeStrategy {
    fn name(&self) -> &str {
        "subtree"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn usage(&self) -> &str {
        "no parameters"
    }

    fn aggregates(&self) -> bool {
        true
    }

    fn compute(&self, request: &ComputeRequest<'_>) -> Result<Element> {
        let source = request.import.name.as_str();
        let delivery = request.delivery.id();
        let mut content = Element::new(CONTENT_TAG);

        match request.import.kind {
            InformationKind::Commits => {
                let mut seen = HashSet::new();
                let mut commits: Vec<Commit> = request
                    .component
                    .children()
                    .iter()
                    .flat_map(|child| child.information(delivery, source).commits())
                    .filter(|commit| seen.insert(commit.hash.clone()))
                    .collect();
                commits.sort_by(|a, b| b.time.cmp(&a.time));
                for commit in &commits {
                    content.push(commit.to_element());
                }
            }
            InformationKind::Version | InformationKind::Text => {
                for child in request.component.children() {
                    let info = child.information(delivery, source);
                    if info.is_empty() || info.error_message().is_some() {
                        continue;
                    }
                    let line = match request.import.kind {
                        InformationKind::Version => format!("{} {}", child.name(), info.text()),
                        _ => info.text(),
                    };
                    content.push(Element::new(STRING_TAG).with_text(line));
                }
            }
        }
        Ok(content)
    }
}
