//! Shared types handed to layouts.
//!
//! Layouts see the current page and the site as object bindings (`${page.url}`,
//! `${site.page_count}`). These summaries are the stable shape of those
//! objects; they are serialized to JSON values before substitution.

use crate::frontmatter::PageDate;
use serde::Serialize;
use serde_json::Value;

/// What a layout can know about a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    /// Source path relative to the input root, `/`-separated.
    pub source_path: String,
    /// Output path relative to the output root, `/`-separated.
    pub output_path: String,
    /// Public URL, rooted at `/`.
    pub url: String,
    pub title: String,
    pub date: PageDate,
    /// Layout filename used to render the page.
    pub layout: String,
}

/// What a layout can know about the site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub input_dir: String,
    pub output_dir: String,
    pub layout_dir: String,
    pub page_count: usize,
    pub static_count: usize,
    /// Loaded layout filenames, sorted.
    pub layouts: Vec<String>,
}

/// Serialize a summary into a binding value.
///
/// Both summaries contain only strings, numbers and lists, which always
/// serialize; `Null` is unreachable in practice.
pub(crate) fn to_value<T: Serialize>(summary: &T) -> Value {
    serde_json::to_value(summary).unwrap_or(Value::Null)
}
