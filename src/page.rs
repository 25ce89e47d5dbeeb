//! Pages: one per markdown source file.
//!
//! A [`Page`] does no work when it is created. Each derived field is computed
//! the first time it is asked for and kept for the page's lifetime:
//!
//! ```text
//! content ─► front matter + body ─► title ─► date
//!                 │                  │
//!                 ├─► layout name    │
//!                 ├─► target (output path, URL)
//!                 └─► content_html ──┴─► render data ─► rendered HTML
//! ```
//!
//! ## Defaults
//!
//! | Field | Source | Fallback |
//! |-------|--------|----------|
//! | `title` | front matter `title` | file name, e.g. `post.md` |
//! | `date` | front matter `date` | the resolved title |
//! | `layout_name` | front matter `layout` | `page.html` |
//!
//! ## Render Data
//!
//! Bindings handed to the layout are merged in increasing priority:
//!
//! 1. [`Page::template_extra`] (empty unless something puts data there)
//! 2. Every front matter key
//! 3. Computed values: `content`, `title`, `date`, `page`, `site`
//!
//! So a front matter `content` key never replaces the converted markdown.

use crate::frontmatter::{self, FrontMatter, FrontMatterError, PageDate};
use crate::layout::LayoutError;
use crate::naming::{self, Target};
use crate::site::Site;
use crate::types::{self, PageSummary};
use pulldown_cmark::{Parser, html as md_html};
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Layout used when front matter names none.
pub const DEFAULT_LAYOUT: &str = "page.html";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error("Failed to render {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: LayoutError,
    },
    #[error("Cannot render {path} against a site that does not contain it")]
    ForeignSite { path: PathBuf },
}

struct Parsed {
    front_matter: FrontMatter,
    /// Byte offset of the body within `content`.
    body_start: usize,
}

pub struct Page {
    source_path: PathBuf,
    relative_path: PathBuf,
    template_extra: Map<String, Value>,
    content: OnceCell<String>,
    // A failed parse is cached too, so parsing happens at most once.
    parsed: OnceCell<Result<Parsed, FrontMatterError>>,
    title: OnceCell<String>,
    date: OnceCell<PageDate>,
    layout_name: OnceCell<String>,
    target: OnceCell<Target>,
    content_html: OnceCell<String>,
    rendered: OnceCell<String>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("source_path", &self.source_path)
            .field("target", &self.target.get())
            .finish_non_exhaustive()
    }
}

/// `OnceCell::get_or_init` for fallible initializers.
fn cached<T, E>(cell: &OnceCell<T>, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}

impl Page {
    /// A page for `source_path`, which should live under `input_root`.
    ///
    /// Nothing is read from disk until a derived field is requested.
    pub fn new(input_root: &Path, source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let relative_path = source_path
            .strip_prefix(input_root)
            .unwrap_or(&source_path)
            .to_path_buf();
        Page {
            source_path,
            relative_path,
            template_extra: Map::new(),
            content: OnceCell::new(),
            parsed: OnceCell::new(),
            title: OnceCell::new(),
            date: OnceCell::new(),
            layout_name: OnceCell::new(),
            target: OnceCell::new(),
            content_html: OnceCell::new(),
            rendered: OnceCell::new(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Source path relative to the input root.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Lowest-priority render bindings.
    pub fn template_extra(&self) -> &Map<String, Value> {
        &self.template_extra
    }

    /// Mutable access to the lowest-priority bindings. Drops any cached
    /// render so the next [`Page::render`] sees the change.
    pub fn template_extra_mut(&mut self) -> &mut Map<String, Value> {
        self.rendered.take();
        &mut self.template_extra
    }

    pub fn content(&self) -> Result<&str, PageError> {
        cached(&self.content, || {
            fs::read_to_string(&self.source_path).map_err(|source| PageError::Io {
                path: self.source_path.clone(),
                source,
            })
        })
        .map(String::as_str)
    }

    fn parsed(&self) -> Result<&Parsed, PageError> {
        let content = self.content()?;
        let parsed = self.parsed.get_or_init(|| {
            frontmatter::split(content).map(|(front_matter, body)| Parsed {
                front_matter,
                body_start: content.len() - body.len(),
            })
        });
        parsed.as_ref().map_err(|source| PageError::FrontMatter {
            path: self.source_path.clone(),
            source: source.clone(),
        })
    }

    pub fn front_matter(&self) -> Result<&FrontMatter, PageError> {
        Ok(&self.parsed()?.front_matter)
    }

    /// Markdown text after the front matter delimiter.
    pub fn body(&self) -> Result<&str, PageError> {
        let start = self.parsed()?.body_start;
        Ok(&self.content()?[start..])
    }

    pub fn title(&self) -> Result<&str, PageError> {
        cached(&self.title, || {
            Ok(match self.front_matter()?.title() {
                Some(title) => title.to_string(),
                None => self
                    .source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        })
        .map(String::as_str)
    }

    pub fn date(&self) -> Result<&PageDate, PageError> {
        cached(&self.date, || {
            Ok(match self.front_matter()?.date() {
                Some(date) => date.clone(),
                None => PageDate::Text(self.title()?.to_string()),
            })
        })
    }

    pub fn layout_name(&self) -> Result<&str, PageError> {
        cached(&self.layout_name, || {
            Ok(self
                .front_matter()?
                .layout()
                .unwrap_or(DEFAULT_LAYOUT)
                .to_string())
        })
        .map(String::as_str)
    }

    /// Whether the page is written as `<name>/index.html`.
    pub fn should_tuck(&self) -> Result<bool, PageError> {
        let subdirize = self.front_matter()?.subdirize();
        Ok(naming::should_tuck(&self.relative_path, subdirize))
    }

    /// Output path (relative to the output root) and public URL.
    pub fn target(&self) -> Result<&Target, PageError> {
        cached(&self.target, || {
            Ok(naming::translate(&self.relative_path, self.should_tuck()?))
        })
    }

    pub fn url(&self) -> Result<&str, PageError> {
        Ok(&self.target()?.url)
    }

    /// The body converted from markdown to HTML.
    pub fn content_html(&self) -> Result<&str, PageError> {
        cached(&self.content_html, || {
            let parser = Parser::new(self.body()?);
            let mut html = String::new();
            md_html::push_html(&mut html, parser);
            Ok(html)
        })
        .map(String::as_str)
    }

    pub fn summary(&self) -> Result<PageSummary, PageError> {
        let target = self.target()?;
        Ok(PageSummary {
            source_path: naming::to_slash_path(&self.relative_path),
            output_path: naming::to_slash_path(&target.output_path),
            url: target.url.clone(),
            title: self.title()?.to_string(),
            date: self.date()?.clone(),
            layout: self.layout_name()?.to_string(),
        })
    }

    /// The merged bindings the layout is rendered with.
    pub fn render_data(&self, site: &Site) -> Result<Map<String, Value>, PageError> {
        let mut data = self.template_extra.clone();
        data.extend(self.front_matter()?.to_bindings());

        data.insert(
            "content".into(),
            Value::String(self.content_html()?.to_string()),
        );
        data.insert("title".into(), Value::String(self.title()?.to_string()));
        data.insert("date".into(), self.date()?.clone().into());
        data.insert("page".into(), types::to_value(&self.summary()?));
        data.insert("site".into(), types::to_value(&site.summary()));
        Ok(data)
    }

    /// Render the page through its layout. Computed once, then cached.
    ///
    /// `site` must be the site this page was discovered by; the cached
    /// output is only valid for that site.
    pub fn render(&self, site: &Site) -> Result<&str, PageError> {
        if !site.pages().as_ptr_range().contains(&std::ptr::from_ref(self)) {
            return Err(PageError::ForeignSite {
                path: self.source_path.clone(),
            });
        }
        cached(&self.rendered, || {
            let data = self.render_data(site)?;
            let layout = self.layout_name()?;
            site.layouts()
                .render(layout, &data)
                .map_err(|source| PageError::Layout {
                    path: self.source_path.clone(),
                    source,
                })
        })
        .map(String::as_str)
    }
}
