//! A DocBook article holding one section per data source.

use crate::error::{DeliveryError, ErrorContext, Result};
use crate::model::{Element, Node};
use std::path::Path;

pub const ARTICLE_TAG: &str = "article";
pub const SECTION_TAG: &str = "section";
pub const TITLE_TAG: &str = "title";
/// Attribute identifying a data source section.
pub const ID_ATTR: &str = "xml:id";

const DOCBOOK_NS: &str = "http://docbook.org/ns/docbook";

/// An exported document, either fresh or loaded for merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocbookDocument {
    root: Element,
}

impl DocbookDocument {
    /// Empty article with a title
    pub fn new(title: &str) -> Self {
        let root = Element::new(ARTICLE_TAG)
            .with_attr("xmlns", DOCBOOK_NS)
            .with_attr("version", "5.0")
            .with_child(Element::new(TITLE_TAG).with_text(title));
        Self { root }
    }

    /// Parse a previously exported document
    pub fn parse(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        if root.name != ARTICLE_TAG {
            return Err(DeliveryError::persistence(
                "reading DocBook document",
                crate::error::PersistenceErrorKind::UnexpectedElement {
                    expected: ARTICLE_TAG.to_string(),
                    found: root.name,
                },
            ));
        }
        Ok(Self { root })
    }

    /// Load a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path).map_err(|e| DeliveryError::io(path, e))?;
        Self::parse(&xml).with_context(|| format!("loading {}", path.display()))
    }

    /// Load `path` if it exists, otherwise start a new document
    pub fn load_or_new(path: &Path, title: &str) -> Result<Self> {
        if path.exists() {
            tracing::info!(path = %path.display(), "Merging into existing document");
            Self::load(path)
        } else {
            Ok(Self::new(title))
        }
    }

    /// Write the document to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml_string()?;
        std::fs::write(path, xml).map_err(|e| DeliveryError::io(path, e))
    }

    pub fn to_xml_string(&self) -> Result<String> {
        self.root.to_xml_document()
    }

    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// Section of a data source, if present
    #[must_use]
    pub fn section(&self, source: &str) -> Option<&Element> {
        self.root
            .children_named(SECTION_TAG)
            .find(|s| s.attr(ID_ATTR) == Some(source))
    }

    /// Section of a data source, appended if missing
    pub fn section_for(&mut self, source: &str) -> &mut Element {
        let position = self.root.children.iter().position(|n| {
            n.as_element()
                .is_some_and(|e| e.name == SECTION_TAG && e.attr(ID_ATTR) == Some(source))
        });
        let index = position.unwrap_or_else(|| {
            let section = Element::new(SECTION_TAG)
                .with_attr(ID_ATTR, source)
                .with_child(Element::new(TITLE_TAG).with_text(section_title(source)));
            self.root.push(section);
            self.root.children.len() - 1
        });
        match &mut self.root.children[index] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("index points at a section"),
        }
    }

    /// Drop a data source section that holds nothing but its title
    pub fn remove_section_if_untouched(&mut self, source: &str) {
        self.root.children.retain(|n| {
            n.as_element().map_or(true, |e| {
                !(e.name == SECTION_TAG
                    && e.attr(ID_ATTR) == Some(source)
                    && e.elements().all(|c| c.name == TITLE_TAG))
            })
        });
    }
}

/// Human readable title of a data source section
fn section_title(source: &str) -> String {
    let mut chars = source.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>().replace(['-', '_'], " ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_for_is_reused() {
        let mut doc = DocbookDocument::new("Notes");
        doc.section_for("commits").push(Element::new("para"));
        doc.section_for("commits").push(Element::new("para"));
        assert_eq!(doc.root().children_named(SECTION_TAG).count(), 1);
        assert_eq!(doc.section("commits").unwrap().children_named("para").count(), 2);
        assert_eq!(
            doc.section("commits").unwrap().child(TITLE_TAG).unwrap().text(),
            "Commits"
        );
    }

    #[test]
    fn test_parse_rejects_other_roots() {
        assert!(DocbookDocument::parse("<book/>").is_err());
        assert!(DocbookDocument::parse("<article><title>x</title></article>").is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.xml");
        let mut doc = DocbookDocument::new("Notes");
        doc.section_for("version");
        doc.save(&path).unwrap();

        let loaded = DocbookDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_untouched_section_removed() {
        let mut doc = DocbookDocument::new("Notes");
        doc.section_for("notes");
        doc.remove_section_if_untouched("notes");
        assert!(doc.section("notes").is_none());
    }
}
