//! Front matter splitting and typed access.
//!
//! A source file may start with a JSON object, terminated by a line that
//! contains exactly `---`:
//!
//! ```text
//! {"title": "Hello", "date": "2024-03-01", "tags": ["intro"]}
//! ---
//! # Hello
//!
//! The body is markdown.
//! ```
//!
//! Without the delimiter the whole file is body and the front matter is empty.
//! The delimiter must appear at most once; a second occurrence is rejected
//! rather than silently folded into the body.
//!
//! ## Recognized Keys
//!
//! | Key | Type | Used for |
//! |-----|------|----------|
//! | `title` | string | `${title}`, default for `date` |
//! | `date` | string, number or boolean | Time series ordering |
//! | `layout` | string | Layout filename, default `page.html` |
//! | `subdirize` | bool | Overrides the tucking rule (see [`crate::naming`]) |
//!
//! Every other key is kept verbatim and passed through to the layout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Separator between the JSON block and the markdown body.
pub const DELIMITER: &str = "\n---\n";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontMatterError {
    #[error("invalid front matter JSON: {0}")]
    Json(String),
    #[error("front matter must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("found {0} front matter delimiters, expected at most one")]
    MultipleDelimiters(usize),
}

impl From<serde_json::Error> for FrontMatterError {
    fn from(e: serde_json::Error) -> Self {
        FrontMatterError::Json(e.to_string())
    }
}

/// Parsed front matter: typed accessors for the recognized keys, everything
/// else in a pass-through map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<PageDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subdirize: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl FrontMatter {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn date(&self) -> Option<&PageDate> {
        self.date.as_ref()
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn subdirize(&self) -> Option<bool> {
        self.subdirize
    }

    /// Keys other than the recognized ones.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.layout.is_none()
            && self.subdirize.is_none()
            && self.extra.is_empty()
    }

    /// All keys, recognized ones included, as render bindings.
    pub fn to_bindings(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        if let Some(title) = &self.title {
            map.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(date) = &self.date {
            map.insert("date".into(), date.clone().into());
        }
        if let Some(layout) = &self.layout {
            map.insert("layout".into(), Value::String(layout.clone()));
        }
        if let Some(subdirize) = self.subdirize {
            map.insert("subdirize".into(), Value::Bool(subdirize));
        }
        map
    }
}

/// Sort key of a page: any JSON scalar except `null`, never a mix of kinds
/// within one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, expecting = "a string, number or boolean date")]
pub enum PageDate {
    Number(Number),
    Text(String),
    Flag(bool),
}

impl PageDate {
    pub fn kind(&self) -> &'static str {
        match self {
            PageDate::Number(_) => "number",
            PageDate::Text(_) => "string",
            PageDate::Flag(_) => "boolean",
        }
    }

    /// Order two dates of the same kind. `None` when the kinds differ.
    pub fn compare(&self, other: &PageDate) -> Option<Ordering> {
        match (self, other) {
            (PageDate::Text(a), PageDate::Text(b)) => Some(a.cmp(b)),
            (PageDate::Number(a), PageDate::Number(b)) => Some(compare_numbers(a, b)),
            (PageDate::Flag(a), PageDate::Flag(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Exact {
    Int(i128),
    Float(f64),
}

impl Exact {
    fn of(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Exact::Int(i.into())
        } else if let Some(u) = n.as_u64() {
            Exact::Int(u.into())
        } else {
            Exact::Float(n.as_f64().unwrap_or_default())
        }
    }
}

/// Numeric order by exact value, so integers beyond 2^53 never collapse
/// onto a nearby float. JSON numbers are finite, so this is a total order.
fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (Exact::of(a), Exact::of(b)) {
        (Exact::Int(x), Exact::Int(y)) => x.cmp(&y),
        (Exact::Float(x), Exact::Float(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Exact::Float(x), Exact::Int(y)) => compare_float_int(x, y),
        (Exact::Int(x), Exact::Float(y)) => compare_float_int(y, x).reverse(),
    }
}

fn compare_float_int(f: f64, i: i128) -> Ordering {
    // 2^127: above every i128, and -2^127 is i128::MIN.
    let limit = i128::MAX as f64;
    let whole = f.trunc();
    if whole >= limit {
        return Ordering::Greater;
    }
    if whole < -limit {
        return Ordering::Less;
    }
    match (whole as i128).cmp(&i) {
        Ordering::Equal => f.partial_cmp(&whole).unwrap_or(Ordering::Equal),
        other => other,
    }
}

impl fmt::Display for PageDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageDate::Number(n) => write!(f, "{n}"),
            PageDate::Text(s) => f.write_str(s),
            PageDate::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<PageDate> for Value {
    fn from(date: PageDate) -> Self {
        match date {
            PageDate::Number(n) => Value::Number(n),
            PageDate::Text(s) => Value::String(s),
            PageDate::Flag(b) => Value::Bool(b),
        }
    }
}

/// Split raw source text into front matter and markdown body.
///
/// The body is returned as a slice of `text`, so callers can keep a single
/// owned copy of the file.
pub fn split(text: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let Some((head, body)) = text.split_once(DELIMITER) else {
        return Ok((FrontMatter::default(), text));
    };

    let more = body.matches(DELIMITER).count();
    if more > 0 {
        return Err(FrontMatterError::MultipleDelimiters(more + 1));
    }

    let value: Value = serde_json::from_str(head)?;
    if !value.is_object() {
        return Err(FrontMatterError::NotAnObject(json_kind(&value)));
    }
    let front_matter = serde_json::from_value(value)?;
    Ok((front_matter, body))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
