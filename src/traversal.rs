//! Generic walks over the component tree.
//!
//! An operation is applied to every descendant of the start component (the
//! start itself is never applied), children in declaration order, and the
//! per-node results are folded with [`TreeOperation::merge`]. With
//! `quick_return`, a node whose result satisfies
//! [`TreeOperation::should_stop`] keeps its result but its descendants are
//! not visited; the walk continues with its next sibling.

use crate::model::Component;

/// A computation performed on each node of a walk.
pub trait TreeOperation {
    type Output;

    /// Result of a walk over a leaf
    fn identity(&self) -> Self::Output;

    /// Process one node
    fn apply(&mut self, component: &Component, delivery: &str) -> Self::Output;

    /// Whether the node's descendants can be skipped
    fn should_stop(&self, output: &Self::Output) -> bool;

    /// Fold two results
    fn merge(&self, acc: Self::Output, next: Self::Output) -> Self::Output;
}

/// Walk the descendants of `component`.
pub fn visit<O>(component: &Component, delivery: &str, quick_return: bool, op: &mut O) -> O::Output
where
    O: TreeOperation + ?Sized,
{
    let mut acc = op.identity();
    for child in component.children() {
        let out = op.apply(child, delivery);
        let skip_descendants = quick_return && op.should_stop(&out);
        acc = op.merge(acc, out);
        if !skip_descendants {
            let nested = visit(child, delivery, quick_return, op);
            acc = op.merge(acc, nested);
        }
    }
    acc
}

/// Whether no descendant holds information for a data source.
///
/// In customer mode, components not flagged customer-relevant count as
/// empty. The walk stops descending as soon as information is found.
#[derive(Debug, Clone)]
pub struct EmptinessCheck<'a> {
    pub source: &'a str,
    pub customer_mode: bool,
}

impl<'a> EmptinessCheck<'a> {
    #[must_use]
    pub const fn new(source: &'a str, customer_mode: bool) -> Self {
        Self {
            source,
            customer_mode,
        }
    }

    /// Whether the component's own information counts as empty
    #[must_use]
    pub fn is_own_empty(&self, component: &Component, delivery: &str) -> bool {
        (self.customer_mode && !component.customer_relevant)
            || component.information(delivery, self.source).is_empty()
    }

    /// Whether all descendants of `component` are empty.
    ///
    /// The component's own information is not consulted.
    #[must_use]
    pub fn is_subtree_empty(&mut self, component: &Component, delivery: &str) -> bool {
        visit(component, delivery, true, self)
    }
}

impl TreeOperation for EmptinessCheck<'_> {
    type Output = bool;

    fn identity(&self) -> bool {
        true
    }

    fn apply(&mut self, component: &Component, delivery: &str) -> bool {
        self.is_own_empty(component, delivery)
    }

    fn should_stop(&self, output: &bool) -> bool {
        !*output
    }

    fn merge(&self, acc: bool, next: bool) -> bool {
        acc && next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryInformation, InformationKind};

    fn note(text: &str) -> DeliveryInformation {
        DeliveryInformation::from_text("notes", InformationKind::Text, text)
    }

    /// root -> [a -> [a1], b -> [b1 (notes)]]
    fn tree() -> Component {
        let mut root = Component::new("root");
        root.push_child(Component::new("a")).push_child(Component::new("a1"));
        root.push_child(Component::new("b"))
            .push_child(Component::new("b1").with_customer_relevant(false))
            .set_information("1.0", note("hidden fix"));
        root
    }

    /// Records visited full names.
    struct Recorder {
        seen: Vec<String>,
        stop_at: &'static str,
    }

    impl TreeOperation for Recorder {
        type Output = usize;
        fn identity(&self) -> usize {
            0
        }
        fn apply(&mut self, component: &Component, _delivery: &str) -> usize {
            self.seen.push(component.full_name().to_string());
            1
        }
        fn should_stop(&self, _output: &usize) -> bool {
            self.seen.last().is_some_and(|s| s == self.stop_at)
        }
        fn merge(&self, acc: usize, next: usize) -> usize {
            acc + next
        }
    }

    #[test]
    fn test_visit_order_excludes_start() {
        let mut op = Recorder { seen: Vec::new(), stop_at: "" };
        let count = visit(&tree(), "1.0", false, &mut op);
        assert_eq!(count, 4);
        assert_eq!(op.seen, vec!["root.a", "root.a.a1", "root.b", "root.b.b1"]);
    }

    #[test]
    fn test_quick_return_skips_descendants_but_not_siblings() {
        let mut op = Recorder { seen: Vec::new(), stop_at: "root.a" };
        visit(&tree(), "1.0", true, &mut op);
        assert_eq!(op.seen, vec!["root.a", "root.b", "root.b.b1"]);
    }

    #[test]
    fn test_emptiness_respects_customer_mode() {
        let root = tree();
        assert!(!EmptinessCheck::new("notes", false).is_subtree_empty(&root, "1.0"));
        assert!(EmptinessCheck::new("notes", true).is_subtree_empty(&root, "1.0"));
        assert!(EmptinessCheck::new("notes", false).is_subtree_empty(&root, "2.0"));
        assert!(EmptinessCheck::new("version", false).is_subtree_empty(&root, "1.0"));
    }

    #[test]
    fn test_emptiness_ignores_start_component() {
        let mut root = Component::new("root").with_child(Component::new("a"));
        root.set_information("1.0", note("on the root"));
        assert!(EmptinessCheck::new("notes", false).is_subtree_empty(&root, "1.0"));
    }
}
