//! Layout templates.
//!
//! Layouts are plain `*.html` files in a single flat directory, loaded once
//! and looked up by filename (`page.html`, `post.html`, ...). There is no
//! control flow in a layout; it only has placeholders:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `${name}` | String form of the `name` binding |
//! | `${page.url}` | Walk into an object binding |
//! | `$name` | Same as `${name}`, identifier characters only |
//! | `$$` | A literal `$` |
//!
//! A `$` that starts none of the above is copied through unchanged.
//!
//! ## String Form
//!
//! Strings are inserted verbatim (no escaping, `content` is already HTML),
//! numbers and booleans as their JSON text, `null` as nothing, and arrays or
//! objects as compact JSON.
//!
//! A placeholder whose key is missing from the bindings fails the render.
//! Walking through a `null` (e.g. `${nav.next.url}` on the last page of a
//! series) yields `null` instead of failing.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error reading layouts at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No such layout file: {0}")]
    MissingLayout(String),
    #[error("Unresolved placeholder ${{{key}}} in layout {layout}")]
    UnresolvedPlaceholder { layout: String, key: String },
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:(?P<escaped>\$)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*(?:\.[_A-Za-z0-9]+)*)\}|(?P<named>[_A-Za-z][_A-Za-z0-9]*))",
    )
    .expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(Vec<String>),
}

/// A layout parsed into literal text and placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            literal.push_str(&text[last..whole.start()]);
            last = whole.end();

            if caps.name("escaped").is_some() {
                literal.push('$');
                continue;
            }
            let Some(key) = caps.name("braced").or_else(|| caps.name("named")) else {
                continue;
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let path = key.as_str().split('.').map(str::to_string).collect();
            segments.push(Segment::Placeholder(path));
        }

        literal.push_str(&text[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Template { segments }
    }

    /// Placeholder keys in order of appearance, dotted paths joined back up.
    pub fn placeholders(&self) -> impl Iterator<Item = String> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(path) => Some(path.join(".")),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute `bindings` into the template.
    ///
    /// On failure, returns the first placeholder key that has no binding.
    pub fn substitute(&self, bindings: &Map<String, Value>) -> Result<String, String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(path) => {
                    let value = lookup(bindings, path).ok_or_else(|| path.join("."))?;
                    push_value(&mut out, value);
                }
            }
        }
        Ok(out)
    }
}

fn lookup<'a>(bindings: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut value = bindings.get(first)?;
    for key in rest {
        value = match value {
            Value::Object(map) => map.get(key)?,
            Value::Null => return Some(value),
            _ => return None,
        };
    }
    Some(value)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}

/// Every layout in the layout directory, keyed by filename.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, Template>,
}

impl LayoutRegistry {
    /// Load every `*.html` file directly under `dir`. Subdirectories are not
    /// searched.
    pub fn load(dir: &Path) -> Result<Self, LayoutError> {
        let io_err = |source| LayoutError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "html") {
                files.push(path);
            }
        }
        files.sort();

        let mut layouts = BTreeMap::new();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|source| LayoutError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(layout = %name, "Loaded layout");
            layouts.insert(name.to_string(), Template::compile(&text));
        }

        Ok(LayoutRegistry { layouts })
    }

    /// Register a layout from text, replacing any layout of the same name.
    pub fn insert(&mut self, name: impl Into<String>, text: &str) {
        self.layouts.insert(name.into(), Template::compile(text));
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.layouts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Layout filenames in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn render(&self, name: &str, bindings: &Map<String, Value>) -> Result<String, LayoutError> {
        let template = self
            .get(name)
            .ok_or_else(|| LayoutError::MissingLayout(name.to_string()))?;
        template
            .substitute(bindings)
            .map_err(|key| LayoutError::UnresolvedPlaceholder {
                layout: name.to_string(),
                key,
            })
    }
}
