//! Per-component tables inside a data source section.

use super::document::{SECTION_TAG, TITLE_TAG};
use crate::model::{Element, Node};

pub const TABLE_TAG: &str = "informaltable";
pub const TGROUP_TAG: &str = "tgroup";
pub const THEAD_TAG: &str = "thead";
pub const TBODY_TAG: &str = "tbody";
pub const ROW_TAG: &str = "row";
pub const ENTRY_TAG: &str = "entry";

fn is_component_section(node: &Node, full_name: &str) -> bool {
    node.as_element().is_some_and(|e| {
        e.name == SECTION_TAG
            && e.child(TITLE_TAG).is_some_and(|t| t.text() == full_name)
            && e.child(TABLE_TAG).is_some()
    })
}

/// Whether the section already holds a table for the component
#[must_use]
pub fn has_component_table(section: &Element, full_name: &str) -> bool {
    section
        .children
        .iter()
        .any(|n| is_component_section(n, full_name))
}

/// Body of the component's table, creating section and table if needed.
///
/// An existing table is reused as is; `headers` only apply to new tables.
pub fn component_table<'s>(
    section: &'s mut Element,
    full_name: &str,
    headers: &[&str],
) -> &'s mut Element {
    let position = section
        .children
        .iter()
        .position(|n| is_component_section(n, full_name));
    let index = position.unwrap_or_else(|| {
        section.push(new_component_section(full_name, headers));
        section.children.len() - 1
    });
    let Node::Element(component_section) = &mut section.children[index] else {
        unreachable!("index points at a component section")
    };
    component_section
        .child_or_insert(TABLE_TAG)
        .child_or_insert(TGROUP_TAG)
        .child_or_insert(TBODY_TAG)
}

fn new_component_section(full_name: &str, headers: &[&str]) -> Element {
    let head_row = headers
        .iter()
        .fold(Element::new(ROW_TAG), |row, h| row.with_child(entry(h)));
    let tgroup = Element::new(TGROUP_TAG)
        .with_attr("cols", headers.len().to_string())
        .with_child(Element::new(THEAD_TAG).with_child(head_row))
        .with_child(Element::new(TBODY_TAG));
    Element::new(SECTION_TAG)
        .with_child(Element::new(TITLE_TAG).with_text(full_name))
        .with_child(Element::new(TABLE_TAG).with_child(tgroup))
}

/// `<entry>` holding plain text
pub fn entry(text: &str) -> Element {
    Element::new(ENTRY_TAG).with_text(text)
}

/// `<entry>` holding arbitrary nodes
pub fn entry_with(children: Vec<Node>) -> Element {
    Element {
        children,
        ..Element::new(ENTRY_TAG)
    }
}

/// `<row>` of entries
pub fn row(entries: impl IntoIterator<Item = Element>) -> Element {
    entries
        .into_iter()
        .fold(Element::new(ROW_TAG), |row, e| row.with_child(e))
}

/// Text of the first entry of a row, used as the row key
#[must_use]
pub fn row_key(row: &Element) -> Option<String> {
    row.child(ENTRY_TAG).map(Element::text)
}

/// Replace the row with the same key, or append it.
///
/// Returns `true` when a row was replaced.
pub fn upsert_row(tbody: &mut Element, new_row: Element) -> bool {
    let key = row_key(&new_row);
    let existing = tbody.elements_mut().find(|r| r.name == ROW_TAG && row_key(r) == key);
    match existing {
        Some(slot) => {
            *slot = new_row;
            true
        }
        None => {
            tbody.push(new_row);
            false
        }
    }
}

/// Append a row unless one with the same key exists.
///
/// Returns `true` when the row was added.
pub fn insert_row_once(tbody: &mut Element, new_row: Element) -> bool {
    let key = row_key(&new_row);
    if tbody.elements().any(|r| r.name == ROW_TAG && row_key(r) == key) {
        return false;
    }
    tbody.push(new_row);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_created_once_per_component() {
        let mut section = Element::new(SECTION_TAG);
        component_table(&mut section, "app.core", &["Delivery", "Former", "Current"])
            .push(row([entry("1.0")]));
        component_table(&mut section, "app.core", &["ignored"]).push(row([entry("1.1")]));
        component_table(&mut section, "app.ui", &["Delivery"]);

        assert_eq!(section.children_named(SECTION_TAG).count(), 2);
        assert!(has_component_table(&section, "app.core"));
        let core = section.children_named(SECTION_TAG).next().unwrap();
        let tgroup = core.child(TABLE_TAG).unwrap().child(TGROUP_TAG).unwrap();
        assert_eq!(tgroup.attr("cols"), Some("3"));
        assert_eq!(tgroup.child(TBODY_TAG).unwrap().elements().count(), 2);
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let mut tbody = Element::new(TBODY_TAG);
        assert!(!upsert_row(&mut tbody, row([entry("1.0"), entry("a")])));
        assert!(upsert_row(&mut tbody, row([entry("1.0"), entry("b")])));
        assert_eq!(tbody.elements().count(), 1);
        assert!(tbody.text().ends_with('b'));

        assert!(!insert_row_once(&mut tbody, row([entry("1.0"), entry("c")])));
        assert!(insert_row_once(&mut tbody, row([entry("2.0")])));
    }
}
