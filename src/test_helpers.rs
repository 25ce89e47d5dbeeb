//! Shared test utilities for the pagewright test suite.
//!
//! Builds throwaway site trees in a temp directory and provides lookups that
//! panic with a listing of what *is* there when the lookup misses.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fixture = SiteFixture::new();
//! fixture
//!     .source("blog/post.md", "{\"title\": \"Post\"}\n---\nBody")
//!     .layout("page.html", "<h1>${title}</h1>${content}");
//!
//! let site = fixture.site();
//! let page = find_page(&site, "blog/post.md");
//! assert_eq!(page.title().unwrap(), "Post");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::page::Page;
use crate::site::Site;
use crate::timeseries::TimeSeries;

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp directory laid out as `input/`, `layouts/` and (after a build)
/// `output/`.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("input")).unwrap();
        fs::create_dir_all(tmp.path().join("layouts")).unwrap();
        SiteFixture { tmp }
    }

    pub fn input_dir(&self) -> PathBuf {
        self.tmp.path().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.tmp.path().join("output")
    }

    pub fn layout_dir(&self) -> PathBuf {
        self.tmp.path().join("layouts")
    }

    /// Write a file under `input/`, creating parent directories.
    pub fn source(&self, rel: &str, text: impl AsRef<[u8]>) -> &Self {
        write_file(&self.input_dir().join(rel), text.as_ref());
        self
    }

    /// Write a layout file under `layouts/`.
    pub fn layout(&self, name: &str, text: &str) -> &Self {
        write_file(&self.layout_dir().join(name), text.as_bytes());
        self
    }

    pub fn config(&self) -> SiteConfig {
        SiteConfig {
            input_dir: self.input_dir(),
            output_dir: self.output_dir(),
            layout_dir: self.layout_dir(),
        }
    }

    pub fn site(&self) -> Site {
        Site::new(self.config()).unwrap()
    }

    /// Read a file under `output/` as text.
    pub fn output(&self, rel: &str) -> String {
        let path = self.output_dir().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read output {}: {e}", path.display()))
    }
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Site lookups: panics with a clear message on miss
// =========================================================================

/// Find a page by input-relative path. Panics if not found.
pub fn find_page<'a>(site: &'a Site, rel: &str) -> &'a Page {
    site.page(rel).unwrap_or_else(|| {
        let paths = page_paths(site);
        panic!("page '{rel}' not found. Available: {paths:?}")
    })
}

/// All page paths, input-relative and `/`-separated, in discovery order.
pub fn page_paths(site: &Site) -> Vec<String> {
    site.pages()
        .iter()
        .map(|p| crate::naming::to_slash_path(p.relative_path()))
        .collect()
}

/// Input-relative paths of a series' pages, in series order.
pub fn series_paths(series: &TimeSeries<'_>) -> Vec<String> {
    series
        .iter()
        .map(|p| crate::naming::to_slash_path(p.relative_path()))
        .collect()
}
