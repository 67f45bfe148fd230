//! Computed information for one (component, delivery, data source) triple.

use super::content::{Element, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Content element wrapping every piece of information.
pub const CONTENT_TAG: &str = "content";
/// Single text value (version string, note line).
pub const STRING_TAG: &str = "string";
/// Commit item.
pub const COMMIT_TAG: &str = "commit";
/// Tag description produced by VCS strategies.
pub const TAG_TAG: &str = "tag";
/// Branch summary produced by VCS strategies.
pub const BRANCH_TAG: &str = "branch";
/// Inline error produced by a failed computation.
pub const ERROR_TAG: &str = "error";

/// The shape of information a data source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InformationKind {
    /// One string per delivery, diffed cell by cell
    Version,
    /// Free text, possibly holding a DocBook fragment
    #[default]
    Text,
    /// A list of commits
    Commits,
}

impl InformationKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Text => "text",
            Self::Commits => "commits",
        }
    }
}

impl fmt::Display for InformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A commit as stored in `<commit>` content nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    /// Commit time in seconds since the epoch
    pub time: Option<i64>,
    pub alm_id: Option<String>,
    pub synopsis: String,
    pub internal_doc: Option<String>,
    pub external_doc: Option<String>,
}

impl Commit {
    pub fn new(hash: impl Into<String>, synopsis: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            synopsis: synopsis.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn with_alm_id(mut self, id: impl Into<String>) -> Self {
        self.alm_id = Some(id.into());
        self
    }

    /// Abbreviated hash used when no tracker id exists
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(10)
            .map_or(self.hash.len(), |(i, _)| i);
        &self.hash[..end]
    }

    /// Identifier shown in exported tables
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.alm_id.as_deref().unwrap_or_else(|| self.short_hash())
    }

    /// Description shown in customer-facing tables
    #[must_use]
    pub fn description(&self) -> &str {
        self.external_doc
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.synopsis)
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(COMMIT_TAG).with_attr("hash", &self.hash);
        if let Some(time) = self.time {
            element.set_attr("time", time.to_string());
        }
        if let Some(id) = &self.alm_id {
            element.set_attr("alm-id", id);
        }
        element.set_attr("synopsis", &self.synopsis);
        if let Some(doc) = &self.internal_doc {
            element.set_attr("internal-doc", doc);
        }
        if let Some(doc) = &self.external_doc {
            element.set_attr("external-doc", doc);
        }
        element
    }

    /// Read a `<commit>` node; `None` for anything else.
    #[must_use]
    pub fn from_element(element: &Element) -> Option<Self> {
        if element.name != COMMIT_TAG {
            return None;
        }
        Some(Self {
            hash: element.attr("hash").unwrap_or_default().to_string(),
            time: element.attr("time").and_then(|t| t.parse().ok()),
            alm_id: element.attr("alm-id").map(str::to_string),
            synopsis: element.attr("synopsis").unwrap_or_default().to_string(),
            internal_doc: element.attr("internal-doc").map(str::to_string),
            external_doc: element.attr("external-doc").map(str::to_string),
        })
    }
}

/// Computed information for one component, delivery and data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInformation {
    source: String,
    kind: InformationKind,
    /// Set while the delivery has not been released yet
    pub is_new: bool,
    content: Element,
}

impl DeliveryInformation {
    /// Empty information for a data source
    pub fn empty(source: impl Into<String>, kind: InformationKind) -> Self {
        Self::with_content(source, kind, Element::new(CONTENT_TAG))
    }

    /// Wrap computed content
    pub fn with_content(source: impl Into<String>, kind: InformationKind, content: Element) -> Self {
        Self {
            source: source.into(),
            kind,
            is_new: false,
            content,
        }
    }

    /// Information holding a single string
    pub fn from_text(source: impl Into<String>, kind: InformationKind, text: impl Into<String>) -> Self {
        Self::with_content(source, kind, string_content(text))
    }

    /// Information holding commits
    pub fn from_commits<'a>(
        source: impl Into<String>,
        commits: impl IntoIterator<Item = &'a Commit>,
    ) -> Self {
        let mut content = Element::new(CONTENT_TAG);
        for commit in commits {
            content.push(commit.to_element());
        }
        Self::with_content(source, InformationKind::Commits, content)
    }

    /// Name of the data source that produced this information
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn kind(&self) -> InformationKind {
        self.kind
    }

    #[must_use]
    pub const fn content(&self) -> &Element {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Element {
        &mut self.content
    }

    /// No meaningful content: no child nodes, or only blank strings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.children.iter().all(|node| match node {
            Node::Text(t) => t.trim().is_empty(),
            Node::Element(e) => e.name == STRING_TAG && e.text().trim().is_empty(),
        })
    }

    /// String values joined by newlines.
    ///
    /// Used as the cell value for version-like data and as the body of
    /// free-text notes.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .children_named(STRING_TAG)
            .map(Element::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Commits contained in the content, in stored order
    #[must_use]
    pub fn commits(&self) -> Vec<Commit> {
        self.content.elements().filter_map(Commit::from_element).collect()
    }

    /// Message of an inline error, if the computation failed
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.content.child(ERROR_TAG).map(Element::text)
    }

    /// Whether this information differs from `other`.
    ///
    /// Version and text information compare stored string values only;
    /// commit lists compare the set of hashes.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        match self.kind {
            InformationKind::Version | InformationKind::Text => self.text() != other.text(),
            InformationKind::Commits => {
                let mine: HashSet<String> = self.commits().into_iter().map(|c| c.hash).collect();
                let theirs: HashSet<String> = other.commits().into_iter().map(|c| c.hash).collect();
                mine != theirs
            }
        }
    }

    /// Accumulate another delivery's content by appending its child nodes.
    ///
    /// Commits already present (same hash) are not duplicated.
    pub fn add_information(&mut self, other: &Self) {
        let known: HashSet<String> = self.commits().into_iter().map(|c| c.hash).collect();
        for child in &other.content.children {
            let duplicate = child
                .as_element()
                .and_then(Commit::from_element)
                .is_some_and(|c| known.contains(&c.hash));
            if !duplicate {
                self.content.children.push(child.clone());
            }
        }
        self.is_new |= other.is_new;
    }
}

/// `<content><string>text</string></content>`
pub fn string_content(text: impl Into<String>) -> Element {
    Element::new(CONTENT_TAG).with_child(Element::new(STRING_TAG).with_text(text))
}

/// `<content><error>message</error></content>`
pub fn error_content(message: impl Into<String>) -> Element {
    Element::new(CONTENT_TAG).with_child(Element::new(ERROR_TAG).with_text(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(DeliveryInformation::empty("version", InformationKind::Version).is_empty());
        assert!(DeliveryInformation::from_text("notes", InformationKind::Text, "  ").is_empty());
        assert!(!DeliveryInformation::from_text("notes", InformationKind::Text, "x").is_empty());

        let failed = DeliveryInformation::with_content(
            "commits",
            InformationKind::Commits,
            error_content("no repository"),
        );
        assert!(!failed.is_empty());
        assert_eq!(failed.error_message().as_deref(), Some("no repository"));
    }

    #[test]
    fn test_version_difference_is_on_string_value() {
        let a = DeliveryInformation::from_text("version", InformationKind::Version, "1.0");
        let b = DeliveryInformation::from_text("version", InformationKind::Version, "1.0");
        let c = DeliveryInformation::from_text("version", InformationKind::Version, "1.1");
        assert!(!a.differs_from(&b));
        assert!(a.differs_from(&c));
    }

    #[test]
    fn test_add_information_joins_text() {
        let mut a = DeliveryInformation::from_text("notes", InformationKind::Text, "x");
        let b = DeliveryInformation::from_text("notes", InformationKind::Text, "y");
        a.add_information(&b);
        assert_eq!(a.text(), "x\ny");
    }

    #[test]
    fn test_add_information_skips_known_commits() {
        let c1 = Commit::new("aaa", "first").with_time(1);
        let c2 = Commit::new("bbb", "second").with_time(2);
        let mut a = DeliveryInformation::from_commits("commits", [&c1]);
        let b = DeliveryInformation::from_commits("commits", [&c1, &c2]);
        a.add_information(&b);
        let hashes: Vec<_> = a.commits().into_iter().map(|c| c.hash).collect();
        assert_eq!(hashes, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_commit_element_roundtrip_and_display() {
        let commit = Commit {
            hash: "0123456789abcdef".into(),
            time: Some(300),
            alm_id: None,
            synopsis: "Fix parser".into(),
            internal_doc: Some("internal".into()),
            external_doc: Some(" ".into()),
        };
        let back = Commit::from_element(&commit.to_element()).unwrap();
        assert_eq!(back, commit);
        assert_eq!(back.display_id(), "0123456789");
        assert_eq!(back.description(), "Fix parser");
    }
}
