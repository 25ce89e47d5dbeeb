//! Site discovery and the build loop.
//!
//! A [`Site`] is created from a [`SiteConfig`]: the layout directory is loaded
//! once, then the input tree is walked once. Every file becomes either a
//! [`Page`] (markdown sources) or a static file (everything else):
//!
//! ```text
//! input/                        output/
//! ├── index.md          ──►     ├── index.html
//! ├── 404.md            ──►     ├── 404.html
//! ├── about.md          ──►     ├── about/index.html
//! ├── blog/
//! │   ├── first.md      ──►     ├── blog/first/index.html
//! │   └── photo.jpg     ──►     ├── blog/photo.jpg        (copied)
//! └── style.css         ──►     └── style.css             (copied)
//! ```
//!
//! Walk order is depth-first with entries sorted by file name, so the page
//! list, the build order, and time-series tie-breaks are the same on every
//! run.
//!
//! ## Failure Policy
//!
//! [`Site::build`] stops at the first error. A page that fails to render is
//! never written, so it leaves no partial file behind. [`Site::build_all`]
//! keeps going and collects the failures in its [`BuildReport`].

use crate::config::{ConfigError, SiteConfig};
use crate::layout::{LayoutError, LayoutRegistry};
use crate::naming::{self, to_slash_path};
use crate::page::{Page, PageError};
use crate::timeseries::{TimeSeries, TimeSeriesError};
use crate::types::SiteSummary;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to scan input: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    TimeSeries(#[from] TimeSeriesError),
}

/// A file that could not be built, and why.
#[derive(Debug)]
pub struct BuildFailure {
    /// Input-relative path of the page or static file.
    pub path: PathBuf,
    pub error: SiteError,
}

/// What a build wrote, as absolute output paths in build order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: Vec<PathBuf>,
    pub static_files: Vec<PathBuf>,
    /// Always empty after [`Site::build`], which fails instead.
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct Site {
    config: SiteConfig,
    layouts: LayoutRegistry,
    pages: Vec<Page>,
    static_files: Vec<PathBuf>,
}

impl Site {
    /// Load layouts and discover the input tree.
    pub fn new(config: SiteConfig) -> Result<Self, SiteError> {
        config.validate()?;
        let layouts = LayoutRegistry::load(&config.layout_dir)?;
        let (pages, static_files) = discover(&config.input_dir)?;

        tracing::info!(
            input = %config.input_dir.display(),
            pages = pages.len(),
            static_files = static_files.len(),
            layouts = layouts.len(),
            "Discovered site"
        );

        Ok(Site {
            config,
            layouts,
            pages,
            static_files,
        })
    }

    pub fn from_dirs(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        layout_dir: impl Into<PathBuf>,
    ) -> Result<Self, SiteError> {
        Self::new(SiteConfig::new(input_dir, output_dir, layout_dir))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn input_dir(&self) -> &Path {
        &self.config.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    /// Pages in discovery order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Input-relative paths of non-markdown files, in discovery order.
    pub fn static_files(&self) -> &[PathBuf] {
        &self.static_files
    }

    /// Look up a page by its input-relative path.
    pub fn page(&self, relative: impl AsRef<Path>) -> Option<&Page> {
        let relative = relative.as_ref();
        self.pages.iter().find(|p| p.relative_path() == relative)
    }

    pub fn page_mut(&mut self, relative: impl AsRef<Path>) -> Option<&mut Page> {
        let relative = relative.as_ref();
        self.pages.iter_mut().find(|p| p.relative_path() == relative)
    }

    pub fn summary(&self) -> SiteSummary {
        SiteSummary {
            input_dir: self.config.input_dir.display().to_string(),
            output_dir: self.config.output_dir.display().to_string(),
            layout_dir: self.config.layout_dir.display().to_string(),
            page_count: self.pages.len(),
            static_count: self.static_files.len(),
            layouts: self.layouts.names().map(str::to_string).collect(),
        }
    }

    /// Date-ordered series of the pages accepted by `predicate`.
    pub fn timeseries<F>(&self, predicate: F) -> Result<TimeSeries<'_>, SiteError>
    where
        F: FnMut(&Page) -> bool,
    {
        Ok(TimeSeries::build(&self.pages, predicate)?)
    }

    /// Expose previous/current/next links to layouts.
    ///
    /// Builds a series from `predicate` and stores each member's navigation
    /// under `key` in its template extras, so a layout can use
    /// `${nav.next.url}` or `${nav.previous.title}`. Returns the number of
    /// pages updated.
    pub fn attach_navigation<F>(&mut self, key: &str, predicate: F) -> Result<usize, SiteError>
    where
        F: FnMut(&Page) -> bool,
    {
        let updates = {
            let series = self.timeseries(predicate)?;
            let mut updates: Vec<(usize, Value)> = Vec::with_capacity(series.len());
            for page in series.iter() {
                let Some(nav) = series.navigation(page) else {
                    continue;
                };
                let Some(index) = self.pages.iter().position(|p| std::ptr::eq(p, page)) else {
                    continue;
                };
                updates.push((index, nav.to_bindings()?));
            }
            updates
        };

        let count = updates.len();
        for (index, nav) in updates {
            self.pages[index]
                .template_extra_mut()
                .insert(key.to_string(), nav);
        }
        tracing::debug!(key, pages = count, "Attached navigation");
        Ok(count)
    }

    /// Absolute output path of `page`.
    pub fn output_path(&self, page: &Page) -> Result<PathBuf, SiteError> {
        Ok(self.config.output_dir.join(&page.target()?.output_path))
    }

    /// Render every page, then copy every static file. Stops at the first
    /// error.
    pub fn build(&self) -> Result<BuildReport, SiteError> {
        let mut report = BuildReport::default();
        for page in &self.pages {
            report.pages.push(self.write_page(page)?);
        }
        for relative in &self.static_files {
            report.static_files.push(self.copy_static(relative)?);
        }
        self.log_report(&report);
        Ok(report)
    }

    /// Like [`Site::build`], but a failing file is recorded and skipped.
    pub fn build_all(&self) -> BuildReport {
        let mut report = BuildReport::default();
        for page in &self.pages {
            match self.write_page(page) {
                Ok(path) => report.pages.push(path),
                Err(error) => report.failures.push(failure(page.relative_path(), error)),
            }
        }
        for relative in &self.static_files {
            match self.copy_static(relative) {
                Ok(path) => report.static_files.push(path),
                Err(error) => report.failures.push(failure(relative, error)),
            }
        }
        self.log_report(&report);
        report
    }

    fn write_page(&self, page: &Page) -> Result<PathBuf, SiteError> {
        let html = page.render(self)?;
        let path = self.output_path(page)?;
        create_parent(&path)?;
        fs::write(&path, html).map_err(|source| SiteError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(
            source = %to_slash_path(page.relative_path()),
            output = %path.display(),
            "Wrote page"
        );
        Ok(path)
    }

    fn copy_static(&self, relative: &Path) -> Result<PathBuf, SiteError> {
        let from = self.config.input_dir.join(relative);
        let to = self.config.output_dir.join(relative);
        create_parent(&to)?;
        fs::copy(&from, &to).map_err(|source| SiteError::Io {
            path: from.clone(),
            source,
        })?;
        tracing::debug!(path = %to_slash_path(relative), "Copied static file");
        Ok(to)
    }

    fn log_report(&self, report: &BuildReport) {
        for failure in &report.failures {
            tracing::warn!(
                path = %failure.path.display(),
                error = %failure.error,
                "Failed to build file"
            );
        }
        tracing::info!(
            output = %self.config.output_dir.display(),
            pages = report.pages.len(),
            static_files = report.static_files.len(),
            failures = report.failures.len(),
            "Build complete"
        );
    }
}

fn failure(path: &Path, error: SiteError) -> BuildFailure {
    BuildFailure {
        path: path.to_path_buf(),
        error,
    }
}

fn create_parent(path: &Path) -> Result<(), SiteError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| SiteError::Io {
        path: parent.to_path_buf(),
        source,
    })
}

/// Walk `root` once, splitting files into pages and static paths.
fn discover(root: &Path) -> Result<(Vec<Page>, Vec<PathBuf>), SiteError> {
    let mut pages = Vec::new();
    let mut static_files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        // Links are not descended, but a link to a file counts as that file.
        if !path.is_file() {
            continue;
        }
        if naming::is_markdown_source(path) {
            pages.push(Page::new(root, path));
        } else {
            let relative = path.strip_prefix(root).unwrap_or(path);
            static_files.push(relative.to_path_buf());
        }
    }

    Ok((pages, static_files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn discovery_partitions_files() {
        let fixture = SiteFixture::new();
        fixture
            .source("index.md", "x")
            .source("blog/post.markdown", "x")
            .source("blog/photo.jpg", [0xFFu8, 0xD8, 0xFF])
            .source("notes.MD", "shouting")
            .source("style.css", "body {}");
        let site = fixture.site();

        assert_eq!(page_paths(&site), vec!["blog/post.markdown", "index.md"]);
        let statics: Vec<String> = site.static_files().iter().map(|p| to_slash_path(p)).collect();
        assert_eq!(statics, vec!["blog/photo.jpg", "notes.MD", "style.css"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_discovered_and_built() {
        use std::os::unix::fs::symlink;

        let fixture = SiteFixture::new();
        fixture
            .source("real/post.md", "{\"title\":\"Post\"}\n---\nbody")
            .source("real/style.css", "body {}")
            .layout("page.html", "${title}");
        let input = fixture.input_dir();
        symlink(input.join("real/style.css"), input.join("linked.css")).unwrap();
        symlink(input.join("real/post.md"), input.join("linked.md")).unwrap();
        symlink(input.join("real"), input.join("mirror")).unwrap();
        let site = fixture.site();

        // The linked directory is not descended into.
        assert_eq!(page_paths(&site), vec!["linked.md", "real/post.md"]);
        let statics: Vec<String> = site.static_files().iter().map(|p| to_slash_path(p)).collect();
        assert_eq!(statics, vec!["linked.css", "real/style.css"]);

        site.build().unwrap();
        assert_eq!(fixture.output("linked/index.html"), "Post");
        assert_eq!(fixture.output("linked.css"), "body {}");
    }

    #[test]
    fn fixture_tree_discovery_order() {
        let tmp = setup_fixtures();
        let root = tmp.path();
        let site =
            Site::from_dirs(root.join("input"), root.join("output"), root.join("layouts")).unwrap();

        assert_eq!(
            page_paths(&site),
            vec![
                "404.md",
                "about.md",
                "blog/first-post.md",
                "blog/second-post.md",
                "blog/third-post.markdown",
                "index.md",
            ]
        );
        assert_eq!(site.static_files().len(), 2);
        assert_eq!(site.layouts().names().collect::<Vec<_>>(), vec!["page.html", "post.html"]);
    }

    #[test]
    fn empty_input_has_no_files() {
        let fixture = SiteFixture::new();
        let site = fixture.site();
        assert!(site.pages().is_empty());
        assert!(site.static_files().is_empty());
    }

    #[test]
    fn missing_input_dir_is_error() {
        let fixture = SiteFixture::new();
        let result = Site::from_dirs(
            fixture.input_dir().join("absent"),
            fixture.output_dir(),
            fixture.layout_dir(),
        );
        assert!(matches!(result, Err(SiteError::Walk(_))));
    }

    #[test]
    fn missing_layout_dir_is_error() {
        let fixture = SiteFixture::new();
        let result = Site::from_dirs(
            fixture.input_dir(),
            fixture.output_dir(),
            fixture.layout_dir().join("absent"),
        );
        assert!(matches!(result, Err(SiteError::Layout(LayoutError::Io { .. }))));
    }

    #[test]
    fn invalid_config_is_error() {
        let fixture = SiteFixture::new();
        let result = Site::from_dirs(fixture.input_dir(), fixture.input_dir(), fixture.layout_dir());
        assert!(matches!(result, Err(SiteError::Config(_))));
    }

    #[test]
    fn build_writes_pages_and_copies_statics() {
        let fixture = SiteFixture::new();
        let image = [0u8, 159, 146, 150, 255];
        fixture
            .source("hello.md", "{\"title\":\"Hi\"}\n---\nHello")
            .source("img/dot.png", image)
            .layout("page.html", "<h1>${title}</h1>${content}");
        let site = fixture.site();
        let report = site.build().unwrap();

        assert_eq!(fixture.output("hello/index.html"), "<h1>Hi</h1><p>Hello</p>\n");
        assert_eq!(fs::read(fixture.output_dir().join("img/dot.png")).unwrap(), image);
        assert_eq!(report.pages, vec![fixture.output_dir().join("hello/index.html")]);
        assert_eq!(report.static_files, vec![fixture.output_dir().join("img/dot.png")]);
        assert!(report.is_success());
    }

    #[test]
    fn build_stops_at_missing_layout_without_partial_output() {
        let fixture = SiteFixture::new();
        fixture
            .source("a.md", "{\"layout\": \"nonexistent.html\"}\n---\nx")
            .source("b.md", "x")
            .layout("page.html", "${content}");
        let site = fixture.site();

        let err = site.build().unwrap_err();
        assert!(err.to_string().contains("nonexistent.html"));
        assert!(!fixture.output_dir().join("a/index.html").exists());
        // Build order is discovery order, so b.md was never reached.
        assert!(!fixture.output_dir().join("b/index.html").exists());
    }

    #[test]
    fn build_all_collects_failures_and_continues() {
        let fixture = SiteFixture::new();
        fixture
            .source("a.md", "{\"layout\": \"nonexistent.html\"}\n---\nx")
            .source("b.md", "{broken\n---\nx")
            .source("c.md", "fine")
            .source("style.css", "body {}")
            .layout("page.html", "${content}");
        let site = fixture.site();
        let report = site.build_all();

        assert!(!report.is_success());
        let failed: Vec<String> = report.failures.iter().map(|f| to_slash_path(&f.path)).collect();
        assert_eq!(failed, vec!["a.md", "b.md"]);
        assert!(matches!(
            report.failures[1].error,
            SiteError::Page(PageError::FrontMatter { .. })
        ));
        assert_eq!(fixture.output("c/index.html"), "<p>fine</p>\n");
        assert_eq!(fixture.output("style.css"), "body {}");
    }

    #[test]
    fn summary_describes_site() {
        let fixture = SiteFixture::new();
        fixture
            .source("a.md", "x")
            .source("b.txt", "x")
            .layout("page.html", "")
            .layout("post.html", "");
        let summary = fixture.site().summary();
        assert_eq!(summary.page_count, 1);
        assert_eq!(summary.static_count, 1);
        assert_eq!(summary.layouts, vec!["page.html", "post.html"]);
    }

    #[test]
    fn attach_navigation_exposes_neighbours() {
        let fixture = SiteFixture::new();
        fixture
            .source("posts/one.md", "{\"title\": \"One\", \"date\": \"2024-01-01\"}\n---\nx")
            .source("posts/two.md", "{\"title\": \"Two\", \"date\": \"2024-02-01\"}\n---\nx")
            .source("about.md", "{\"layout\": \"plain.html\"}\n---\nx")
            .layout("page.html", "[${nav.previous.title}|${nav.current.title}|${nav.next.url}]")
            .layout("plain.html", "${content}");
        let mut site = fixture.site();

        let count = site
            .attach_navigation("nav", |p| p.relative_path().starts_with("posts"))
            .unwrap();
        assert_eq!(count, 2);
        assert!(site.page("about.md").unwrap().template_extra().is_empty());

        site.build().unwrap();
        assert_eq!(fixture.output("posts/one/index.html"), "[|One|/posts/two/]");
        assert_eq!(fixture.output("posts/two/index.html"), "[One|Two|]");
    }

    #[test]
    fn timeseries_over_site_pages() {
        let fixture = SiteFixture::new();
        fixture
            .source("b.md", "{\"date\": 2}\n---\nx")
            .source("a.md", "{\"date\": 1}\n---\nx");
        let site = fixture.site();
        let series = site.timeseries(|_| true).unwrap();
        assert_eq!(series_paths(&series), vec!["a.md", "b.md"]);
    }
}
