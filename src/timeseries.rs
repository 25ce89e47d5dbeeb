//! Date-ordered views over pages.
//!
//! A [`TimeSeries`] borrows a subset of the site's pages and orders them by
//! [`Page::date`], oldest first. Pages with equal dates keep their discovery
//! order. Series are cheap and rebuilt on demand, so they never go stale.
//!
//! ```text
//! series:      [2024-01, 2024-02, 2024-03]
//! navigation(2024-02) → previous 2024-01, current 2024-02, next 2024-03
//! navigation(2024-03) → previous 2024-02, current 2024-03, next none
//! ```
//!
//! Dates within one series must all be strings or all be numbers. A mix has no
//! meaningful order and is rejected when the series is built.

use crate::frontmatter::PageDate;
use crate::page::{Page, PageError};
use crate::types;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeSeriesError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("Cannot order {first} ({first_kind} date) against {second} ({second_kind} date)")]
    SortKeyMismatch {
        first: PathBuf,
        first_kind: &'static str,
        second: PathBuf,
        second_kind: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct TimeSeries<'a> {
    pages: Vec<&'a Page>,
}

/// A page's neighbours within a series.
#[derive(Debug, Clone, Copy)]
pub struct Navigation<'a> {
    pub previous: Option<&'a Page>,
    pub current: &'a Page,
    pub next: Option<&'a Page>,
}

impl<'a> TimeSeries<'a> {
    /// Keep the pages accepted by `predicate`, sorted by date ascending.
    pub fn build<I, F>(pages: I, mut predicate: F) -> Result<Self, TimeSeriesError>
    where
        I: IntoIterator<Item = &'a Page>,
        F: FnMut(&Page) -> bool,
    {
        let mut keyed: Vec<(&'a PageDate, &'a Page)> = Vec::new();
        for page in pages {
            if predicate(page) {
                keyed.push((page.date()?, page));
            }
        }

        if let Some(&(first_date, first)) = keyed.first()
            && let Some(&(other_date, other)) = keyed
                .iter()
                .find(|(date, _)| date.kind() != first_date.kind())
        {
            return Err(TimeSeriesError::SortKeyMismatch {
                first: first.source_path().to_path_buf(),
                first_kind: first_date.kind(),
                second: other.source_path().to_path_buf(),
                second_kind: other_date.kind(),
            });
        }

        // Stable: equal dates keep discovery order. Kinds are uniform here.
        keyed.sort_by(|(a, _), (b, _)| a.compare(b).unwrap_or(std::cmp::Ordering::Equal));

        Ok(TimeSeries {
            pages: keyed.into_iter().map(|(_, page)| page).collect(),
        })
    }

    /// Every page, sorted by date.
    pub fn all<I>(pages: I) -> Result<Self, TimeSeriesError>
    where
        I: IntoIterator<Item = &'a Page>,
    {
        Self::build(pages, |_| true)
    }

    pub fn pages(&self) -> &[&'a Page] {
        &self.pages
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Page> + '_ {
        self.pages.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The page at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&'a Page> {
        self.pages.get(index).copied()
    }

    /// Position of `page` in the series, by identity.
    pub fn position(&self, page: &Page) -> Option<usize> {
        self.pages.iter().position(|p| std::ptr::eq(*p, page))
    }

    /// Previous, current and next pages around `page`; `None` if the page is
    /// not part of this series.
    pub fn navigation(&self, page: &Page) -> Option<Navigation<'a>> {
        let index = self.position(page)?;
        Some(Navigation {
            previous: index.checked_sub(1).and_then(|i| self.get(i)),
            current: self.pages[index],
            next: self.get(index + 1),
        })
    }
}

impl Navigation<'_> {
    /// `{previous, current, next}` as page summaries, `null` at the edges.
    pub fn to_bindings(&self) -> Result<Value, PageError> {
        let summary = |page: Option<&Page>| -> Result<Value, PageError> {
            Ok(match page {
                Some(page) => types::to_value(&page.summary()?),
                None => Value::Null,
            })
        };

        let mut map = Map::new();
        map.insert("previous".into(), summary(self.previous)?);
        map.insert("current".into(), summary(Some(self.current))?);
        map.insert("next".into(), summary(self.next)?);
        Ok(Value::Object(map))
    }
}
