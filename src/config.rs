//! Site configuration.
//!
//! Three directories drive a build. All have defaults, so a config file is
//! optional; when present it is TOML and may set any subset:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "./input"     # Source tree: markdown pages and static files
//! output_dir = "./output"   # Destination tree, created as needed
//! layout_dir = "."          # Flat directory of *.html layouts
//! ```
//!
//! Relative paths are resolved against the process working directory, not
//! the config file's location.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Where to read sources and layouts from, and where to write the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Root of the source tree.
    pub input_dir: PathBuf,
    /// Root of the generated tree.
    pub output_dir: PathBuf,
    /// Directory holding `*.html` layouts (not searched recursively).
    pub layout_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            layout_dir: PathBuf::from("."),
        }
    }
}

impl SiteConfig {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        layout_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            layout_dir: layout_dir.into(),
        }
    }

    /// Reject settings that cannot produce a sensible build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("input_dir", &self.input_dir),
            ("output_dir", &self.output_dir),
            ("layout_dir", &self.layout_dir),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if normalize(&self.input_dir) == normalize(&self.output_dir) {
            return Err(ConfigError::Validation(
                "output_dir must differ from input_dir".into(),
            ));
        }
        Ok(())
    }
}

/// Drop `.` components so `./input` and `input` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults if the file does not
/// exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# pagewright site configuration
# All options are optional - defaults shown below.

# Source tree. Files ending in .md, .mdown, .mkdown or .markdown become
# pages; everything else is copied unchanged.
input_dir = "./input"

# Destination tree, created as needed.
output_dir = "./output"

# Flat directory of *.html layouts. Pages use page.html unless their
# front matter sets "layout".
layout_dir = "."
"#
}
