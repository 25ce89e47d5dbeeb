//! Source-path to output-path translation.
//!
//! Every markdown source maps to exactly one output file and one public URL.
//! By default a page is *tucked* into its own directory so its URL has no
//! `.html` suffix:
//!
//! - `blog/post.md` → `blog/post/index.html`, URL `/blog/post/`
//! - `index.md` → `index.html`, URL `/`
//! - `404.md` → `404.html`, URL `/404.html`
//!
//! Files whose name starts with `index.` or `404.` are not tucked, since they
//! already are the directory's index (or the server's not-found page). A
//! `subdirize` boolean in front matter overrides the name-based default in
//! either direction.

use std::path::{Component, Path, PathBuf};

/// Suffixes that mark a file as a markdown source. Matched case-sensitively.
pub const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".mdown", ".mkdown", ".markdown"];

/// Where a page lands: the output file relative to the output root, and the
/// URL it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub output_path: PathBuf,
    pub url: String,
}

/// The markdown suffix `name` ends with, if any.
fn markdown_suffix(name: &str) -> Option<&'static str> {
    MARKDOWN_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| name.ends_with(ext))
}

pub fn is_markdown_source(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(markdown_suffix)
        .is_some()
}

/// Name-based tucking default: everything except `index.*` and `404.*`.
pub fn tucks_by_default(relative: &Path) -> bool {
    let name = relative
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !(name.starts_with("index.") || name.starts_with("404."))
}

/// Resolve the tucking decision: an explicit `subdirize` wins.
pub fn should_tuck(relative: &Path, subdirize: Option<bool>) -> bool {
    subdirize.unwrap_or_else(|| tucks_by_default(relative))
}

/// Translate a source-relative markdown path into its output target.
///
/// A path without a markdown suffix keeps its name and gains `.html` (or
/// `/index.html`), so the function is total.
pub fn translate(relative: &Path, tuck: bool) -> Target {
    let name = relative
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match markdown_suffix(&name) {
        Some(ext) => &name[..name.len() - ext.len()],
        None => name.as_str(),
    };

    let parent = relative.parent().unwrap_or(Path::new(""));
    let output_path = if tuck {
        parent.join(stem).join("index.html")
    } else {
        parent.join(format!("{stem}.html"))
    };

    let url = public_url(&output_path);
    Target { output_path, url }
}

/// Root a relative output path at `/`, collapsing a trailing `index.html`.
fn public_url(output_path: &Path) -> String {
    let url = format!("/{}", to_slash_path(output_path));
    match url.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => dir.to_string(),
        _ => url,
    }
}

/// Join the normal components of `path` with `/`, whatever the platform.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
