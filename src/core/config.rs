// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Configuration Module
//!
//! Build configuration for Leafpress: where to read sources, where to write
//! the site, and how the optional server and watcher behave. Values come
//! from three layers, applied in order:
//!
//! 1. An optional TOML file (`leafpress.toml` by default)
//! 2. Environment variables with a prefix (`LEAFPRESS_OUTPUT_DIR`,
//!    `LEAFPRESS_OUTPUT__MINIFY` for sectioned keys)
//! 3. Explicit overrides, which is how command-line flags are applied
//!
//! The result is a plain [`BuildConfig`] value. It is never mutated once
//! the build starts.
//!
//! ## Example
//!
//! ```rust
//! use leafpress::core::config::ConfigBuilder;
//! use std::path::PathBuf;
//!
//! let config = ConfigBuilder::new()
//!     .with_override("source_dir", "site")
//!     .with_override("output.minify", true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.source_dir, PathBuf::from("site"));
//! assert!(config.output.minify);
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::{LeafpressError, Result};

/// Name of the build configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "leafpress.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LEAFPRESS_";

/// Keys accepted by overrides, in their dotted form.
const OVERRIDE_KEYS: [&str; 10] = [
    "source_dir",
    "output_dir",
    "clean",
    "markdown.tables",
    "markdown.strikethrough",
    "markdown.footnotes",
    "output.minify",
    "serve.enabled",
    "serve.port",
    "serve.watch",
];

/// Represents the complete build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_source_dir")]
    /// Directory containing content, layouts, partials and data.
    pub source_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    /// Directory the site is written to.
    pub output_dir: PathBuf,

    #[serde(default)]
    /// Remove the output directory before building.
    pub clean: bool,

    #[serde(default)]
    /// Markdown conversion settings.
    pub markdown: MarkdownConfig,

    #[serde(default)]
    /// Output post-processing settings.
    pub output: OutputConfig,

    #[serde(default)]
    /// Development server and watcher settings.
    pub serve: ServeConfig,
}

/// Markdown extensions enabled during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default = "default_true")]
    /// GitHub-style tables.
    pub tables: bool,

    #[serde(default = "default_true")]
    /// `~~strikethrough~~` spans.
    pub strikethrough: bool,

    #[serde(default)]
    /// Footnote references and definitions.
    pub footnotes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: false,
        }
    }
}

/// Settings applied to written pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    /// Minify generated HTML pages.
    pub minify: bool,
}

/// Development server and watcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default)]
    /// Serve the output directory over HTTP after building.
    pub enabled: bool,

    #[serde(default = "default_port")]
    /// Port for the development server.
    pub port: u16,

    #[serde(default)]
    /// Rebuild when the source tree changes.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_port(),
            watch: false,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            clean: false,
            markdown: MarkdownConfig::default(),
            output: OutputConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}

/// Builds a [`BuildConfig`] from a file, the environment and overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    optional_file: bool,
    env_prefix: Option<String>,
    overrides: BTreeMap<String, TomlValue>,
}

impl ConfigBuilder {
    /// Initialises a new `ConfigBuilder` instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from a TOML file that must exist.
    ///
    /// # Parameters
    /// - `path`: The path to the TOML configuration file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self.optional_file = false;
        self
    }

    /// Reads configuration from a TOML file when it exists.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self.optional_file = true;
        self
    }

    /// Adds a prefix for environment variables to override configuration values.
    ///
    /// # Parameters
    /// - `prefix`: The prefix for environment variables (e.g., "LEAFPRESS_").
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds a key-value pair to override configuration values.
    ///
    /// Keys use the TOML layout: `output_dir`, `serve.port`, `output.minify`.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<TomlValue>,
    {
        _ = self.overrides.insert(key.into(), value.into());
        self
    }

    /// Builds the final configuration by applying all layers in order.
    pub fn build(self) -> Result<BuildConfig> {
        let mut config = match self.config_file {
            Some(path) if self.optional_file && !path.exists() => {
                BuildConfig::default()
            }
            Some(path) => load_from_file(&path)?,
            None => BuildConfig::default(),
        };

        if let Some(prefix) = self.env_prefix {
            apply_env_overrides(&mut config, &prefix)?;
        }

        apply_overrides(&mut config, &self.overrides)?;
        validate_config(&config)?;

        Ok(config)
    }
}

// Internal helper functions

fn load_from_file(path: &Path) -> Result<BuildConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        LeafpressError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        LeafpressError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })
}

fn apply_env_overrides(config: &mut BuildConfig, prefix: &str) -> Result<()> {
    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let config_key = stripped
                .trim_start_matches('_')
                .to_lowercase()
                .replace("__", ".");
            if !OVERRIDE_KEYS.contains(&config_key.as_str()) {
                warn!("Ignoring unknown environment setting {}", key);
                continue;
            }
            apply_config_value(config, &config_key, &value)?;
        }
    }
    Ok(())
}

fn apply_overrides(
    config: &mut BuildConfig,
    overrides: &BTreeMap<String, TomlValue>,
) -> Result<()> {
    for (key, value) in overrides {
        apply_config_value(config, key, &override_text(value))?;
    }
    Ok(())
}

fn validate_config(config: &BuildConfig) -> Result<()> {
    if config.source_dir.as_os_str().is_empty() {
        return Err(LeafpressError::config_error(
            "Source directory cannot be empty",
            None,
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(LeafpressError::config_error(
            "Output directory cannot be empty",
            None,
        ));
    }

    if config.source_dir == config.output_dir {
        return Err(LeafpressError::config_error(
            "Source and output directories must differ",
            Some(config.output_dir.clone()),
        ));
    }

    if config.serve.enabled && config.serve.port == 0 {
        return Err(LeafpressError::config_error(
            "Server port must be non-zero",
            None,
        ));
    }

    Ok(())
}

/// Text form of an override; strings are taken verbatim, not TOML-quoted.
fn override_text(value: &TomlValue) -> String {
    match value {
        TomlValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn apply_config_value(config: &mut BuildConfig, key: &str, value: &str) -> Result<()> {
    let value_str = value.trim();
    match key {
        "source_dir" => config.source_dir = PathBuf::from(value),
        "output_dir" => config.output_dir = PathBuf::from(value),
        "clean" => config.clean = parse_value(key, value_str)?,
        "markdown.tables" => {
            config.markdown.tables = parse_value(key, value_str)?
        }
        "markdown.strikethrough" => {
            config.markdown.strikethrough = parse_value(key, value_str)?
        }
        "markdown.footnotes" => {
            config.markdown.footnotes = parse_value(key, value_str)?
        }
        "output.minify" => config.output.minify = parse_value(key, value_str)?,
        "serve.enabled" => config.serve.enabled = parse_value(key, value_str)?,
        "serve.port" => config.serve.port = parse_value(key, value_str)?,
        "serve.watch" => config.serve.watch = parse_value(key, value_str)?,
        _ => {
            return Err(LeafpressError::config_error(
                format!("Unknown configuration key: {}", key),
                None,
            ));
        }
    }
    Ok(())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        LeafpressError::config_error(
            format!("Invalid {} value '{}': {}", key, value, e),
            None,
        )
    })
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("html")
}
