//! Table rows for each information variant.

use super::table::{entry, entry_with, row};
use crate::model::{Commit, DeliveryInformation, Element, Node};
use std::cmp::Ordering;

pub const EMPHASIS_TAG: &str = "emphasis";
pub const PARA_TAG: &str = "para";

/// Value shown for information, the error message if it failed
fn cell_text(info: &DeliveryInformation) -> String {
    info.error_message()
        .map_or_else(|| info.text(), |message| format!("error: {message}"))
}

/// `[delivery, former value, current value]`.
///
/// The current value is set in bold when its stored string differs from
/// the former one.
pub fn version_row(
    delivery: &str,
    former: &DeliveryInformation,
    current: &DeliveryInformation,
) -> Element {
    let current_text = cell_text(current);
    let current_cell = if current.differs_from(former) {
        entry_with(vec![Node::Element(
            Element::new(EMPHASIS_TAG)
                .with_attr("role", "bold")
                .with_text(current_text),
        )])
    } else {
        entry(&current_text)
    };
    row([entry(delivery), entry(&cell_text(former)), current_cell])
}

/// Order commits newest first.
///
/// The sort is stable; commits without a time keep their relative order
/// after all timed ones.
pub fn sort_commits(commits: &mut [Commit]) {
    commits.sort_by(|a, b| match (a.time, b.time) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// `[identifier, description]`
pub fn commit_row(commit: &Commit) -> Element {
    row([entry(commit.display_id()), entry(commit.description())])
}

/// `[delivery, body]`.
///
/// A body that parses as a well-formed fragment containing markup is
/// spliced into the entry; anything else becomes a literal paragraph.
pub fn text_row(delivery: &str, info: &DeliveryInformation) -> Element {
    let body = match info.error_message() {
        Some(message) => literal(&format!("error: {message}")),
        None => text_cell(&info.text()),
    };
    row([entry(delivery), body])
}

fn text_cell(text: &str) -> Element {
    match Element::parse_fragment(text) {
        Ok(nodes) if nodes.iter().any(|n| matches!(n, Node::Element(_))) => entry_with(nodes),
        Ok(nodes) => {
            let plain: String = nodes
                .iter()
                .filter_map(|n| match n {
                    Node::Text(t) => Some(t.as_str()),
                    Node::Element(_) => None,
                })
                .collect();
            literal(&plain)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Text is not a DocBook fragment, writing it literally");
            literal(text)
        }
    }
}

fn literal(text: &str) -> Element {
    entry_with(vec![Node::Element(Element::new(PARA_TAG).with_text(text))])
}
