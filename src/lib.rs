//! # Pagewright
//!
//! A minimal static site generator. Markdown files with optional JSON front
//! matter become HTML pages by substitution into plain `*.html` layouts;
//! every other file is copied unchanged.
//!
//! ```rust,no_run
//! use pagewright::site::Site;
//!
//! let site = Site::from_dirs("input", "output", "layouts")?;
//! site.build()?;
//! # Ok::<(), pagewright::site::SiteError>(())
//! ```
//!
//! # Architecture: Lazy Pages, One Pass
//!
//! ```text
//! 1. Discover   input/   →  pages + static files   (one walk, sorted by name)
//! 2. Render     page     →  front matter, body, markdown, bindings, layout
//! 3. Write      output/  ←  rendered pages, copied static files
//! ```
//!
//! Each [`page::Page`] computes its derived fields on first use and keeps
//! them, so a page is read and parsed at most once however many times a
//! layout, a time series or the build loop asks about it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Discovery, the build loop, navigation bindings |
//! | [`page`] | One source file: lazy fields, render data, rendering |
//! | [`frontmatter`] | Splitting source text; typed front matter and dates |
//! | [`naming`] | Source path → output path and URL (the tucking rule) |
//! | [`layout`] | Layout loading and `${name}` substitution |
//! | [`timeseries`] | Date-ordered page views with previous/next lookup |
//! | [`config`] | Directory settings, optionally from TOML |
//! | [`types`] | Page and site summaries exposed to layouts |
//!
//! # Design Decisions
//!
//! ## Clean URLs by Default
//!
//! `about.md` is written to `about/index.html` and served as `/about/`.
//! `index.*` and `404.*` files are the exception, and front matter can flip
//! the choice per page with `"subdirize": true|false`. See [`naming`].
//!
//! ## Layouts Without Logic
//!
//! Layouts only substitute values. Anything a layout needs (navigation,
//! sibling pages) is computed in Rust and handed over as bindings; see
//! [`site::Site::attach_navigation`].
//!
//! ## Strict Inputs
//!
//! Malformed front matter, a missing layout, an unbound placeholder and a
//! time series mixing string and numeric dates are all errors. Nothing is
//! silently skipped unless the caller opts in with
//! [`site::Site::build_all`].
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber; the
//! embedding program decides where they go.

pub mod config;
pub mod frontmatter;
pub mod layout;
pub mod naming;
pub mod page;
pub mod site;
pub mod timeseries;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
