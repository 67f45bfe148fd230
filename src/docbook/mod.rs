//! DocBook export and diff rendering.
//!
//! Each data source becomes a `<section>` of an `<article>`; each component
//! with information becomes a sub-section holding an `<informaltable>`.
//! Exporting into a loaded document reuses its tables, so several
//! deliveries can be merged into one cumulative document.

mod document;
mod export;
mod render;
mod table;

pub use document::{DocbookDocument, ARTICLE_TAG, ID_ATTR, SECTION_TAG, TITLE_TAG};
pub use export::{DocbookExporter, ExportOptions, ExportSummary, FillStep, SectionFill};
pub use render::{commit_row, sort_commits, text_row, version_row, EMPHASIS_TAG, PARA_TAG};
pub use table::{
    component_table, has_component_table, ENTRY_TAG, ROW_TAG, TABLE_TAG, TBODY_TAG, TGROUP_TAG,
    THEAD_TAG,
};
