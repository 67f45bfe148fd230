//! Export of a component tree into a DocBook document.

use super::document::DocbookDocument;
use super::render::{commit_row, sort_commits, text_row, version_row};
use super::table::{component_table, entry, insert_row_once, row, upsert_row};
use crate::collaborators::AlmSession;
use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{Component, Element, InformationKind};
use crate::plugins::{ImportStrategy, PluginRegistry};
use crate::traversal::{visit, EmptinessCheck, TreeOperation};

/// What to export and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Delivery the document describes
    pub delivery: String,
    /// Delivery compared against in version tables
    pub former: Option<String>,
    /// Only customer-relevant components
    pub customer_mode: bool,
    /// Section order by data source name
    pub order: Vec<String>,
    pub former_column_label: String,
    pub current_column_label: String,
    /// ALM adapter filtering exported commits
    pub alm: Option<String>,
}

impl ExportOptions {
    /// Options for `delivery` taken from the configuration
    pub fn from_config(
        config: &AppConfig,
        delivery: impl Into<String>,
        former: Option<String>,
    ) -> Self {
        Self {
            delivery: delivery.into(),
            former,
            customer_mode: config.export.customer_mode,
            order: config.export_order.clone(),
            former_column_label: config.export.former_column_label.clone(),
            current_column_label: config.export.current_column_label.clone(),
            alm: config.alm.clone(),
        }
    }
}

/// Counts of what an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data source sections written, in document order
    pub sections: Vec<String>,
    /// Data sources without any information
    pub skipped: Vec<String>,
    /// Components that received rows
    pub tables: usize,
    /// Rows added or replaced
    pub rows: usize,
}

/// Writes delivery information into a [`DocbookDocument`].
pub struct DocbookExporter<'a> {
    registry: &'a PluginRegistry,
    options: ExportOptions,
}

impl<'a> DocbookExporter<'a> {
    #[must_use]
    pub const fn new(registry: &'a PluginRegistry, options: ExportOptions) -> Self {
        Self { registry, options }
    }

    #[must_use]
    pub const fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export the components below `root`.
    ///
    /// Existing component tables in `document` are reused, which lets
    /// repeated exports accumulate into one document.
    pub fn export(&self, root: &Component, document: &mut DocbookDocument) -> Result<ExportSummary> {
        let delivery = self.options.delivery.as_str();
        let mut summary = ExportSummary::default();

        for import in self.registry.imports_in_order(&self.options.order) {
            let mut emptiness = EmptinessCheck::new(&import.name, self.options.customer_mode);
            if emptiness.is_subtree_empty(root, delivery) {
                tracing::debug!(source = %import.name, "No information, section skipped");
                summary.skipped.push(import.name.clone());
                continue;
            }

            let alm = self.alm_session(import)?;
            let section = document.section_for(&import.name);
            let mut fill = SectionFill {
                section,
                import,
                options: &self.options,
                emptiness,
                alm,
                rows: 0,
            };
            let step = visit(root, delivery, true, &mut fill);
            let rows = fill.rows;
            drop(fill);
            if step.added == 0 {
                document.remove_section_if_untouched(&import.name);
                summary.skipped.push(import.name.clone());
                continue;
            }

            tracing::info!(
                source = %import.name,
                tables = step.added,
                rows,
                "Section exported"
            );
            summary.sections.push(import.name.clone());
            summary.tables += step.added;
            summary.rows += rows;
        }
        Ok(summary)
    }

    fn alm_session(&self, import: &ImportStrategy) -> Result<Option<AlmSession>> {
        if import.kind != InformationKind::Commits {
            return Ok(None);
        }
        match &self.options.alm {
            Some(name) => Ok(Some(AlmSession::open(self.registry.alm(name)?))),
            None => {
                tracing::info!(
                    source = %import.name,
                    "No ALM configured, commits are exported without tracker filtering"
                );
                Ok(None)
            }
        }
    }
}

/// Result of filling one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillStep {
    /// Tables that received rows
    pub added: usize,
    /// The node and all of its descendants are empty
    pub subtree_empty: bool,
}

/// Adds a table per component with information to a section.
///
/// Descendants of a component whose whole subtree is empty are skipped.
pub struct SectionFill<'d> {
    section: &'d mut Element,
    import: &'d ImportStrategy,
    options: &'d ExportOptions,
    emptiness: EmptinessCheck<'d>,
    alm: Option<AlmSession>,
    rows: usize,
}

impl SectionFill<'_> {
    /// Write the component's rows; returns whether it has a table.
    fn write_rows(&mut self, component: &Component, delivery: &str) -> bool {
        let source = self.import.name.as_str();
        let current = component.information(delivery, source);
        let full_name = component.full_name();

        match self.import.kind {
            InformationKind::Version => {
                let former_id = self.options.former.as_deref().unwrap_or_default();
                let former = component.information(former_id, source);
                let headers = [
                    "Delivery",
                    self.options.former_column_label.as_str(),
                    self.options.current_column_label.as_str(),
                ];
                let tbody = component_table(self.section, full_name, &headers);
                upsert_row(tbody, version_row(delivery, former, current));
                self.rows += 1;
                true
            }
            InformationKind::Text => {
                let tbody = component_table(self.section, full_name, &["Delivery", "Notes"]);
                upsert_row(tbody, text_row(delivery, current));
                self.rows += 1;
                true
            }
            InformationKind::Commits => {
                let mut commits = current.commits();
                sort_commits(&mut commits);
                if let Some(alm) = &self.alm {
                    match alm.filter_and_sort(commits.clone()) {
                        Ok(filtered) => commits = filtered,
                        Err(e) => tracing::warn!(
                            component = %full_name,
                            error = %e,
                            "ALM filtering failed, exporting unfiltered commits"
                        ),
                    }
                }
                let rows: Vec<Element> = current
                    .error_message()
                    .map(|message| row([entry("error"), entry(&message)]))
                    .into_iter()
                    .chain(commits.iter().map(commit_row))
                    .collect();
                if rows.is_empty() {
                    tracing::debug!(component = %full_name, "No commits left after ALM filtering");
                    return false;
                }
                let tbody = component_table(self.section, full_name, &["Identifier", "Description"]);
                for new_row in rows {
                    if insert_row_once(tbody, new_row) {
                        self.rows += 1;
                    }
                }
                true
            }
        }
    }
}

impl TreeOperation for SectionFill<'_> {
    type Output = FillStep;

    fn identity(&self) -> FillStep {
        FillStep {
            added: 0,
            subtree_empty: true,
        }
    }

    fn apply(&mut self, component: &Component, delivery: &str) -> FillStep {
        let own_empty = self.emptiness.is_own_empty(component, delivery);
        let added = !own_empty && self.write_rows(component, delivery);
        let subtree_empty = own_empty && self.emptiness.is_subtree_empty(component, delivery);
        FillStep {
            added: usize::from(added),
            subtree_empty,
        }
    }

    fn should_stop(&self, output: &FillStep) -> bool {
        output.subtree_empty
    }

    fn merge(&self, acc: FillStep, next: FillStep) -> FillStep {
        FillStep {
            added: acc.added + next.added,
            subtree_empty: acc.subtree_empty && next.subtree_empty,
        }
    }
}
