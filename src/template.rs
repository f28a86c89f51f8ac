// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Template Rendering Module
//!
//! A deliberately small template language with two markers:
//!
//! - `{{> name }}` includes `_includes/name.html`
//! - `{{ dotted.key }}` interpolates a value from the render context
//!
//! Rendering runs two passes in a fixed order. Partials are expanded
//! first, repeatedly, until no markers remain or the depth limit is hit;
//! the variable pass then runs once over the combined text, so a
//! partial's own markers resolve against the caller's context.
//!
//! Values are inserted without escaping.
//!
//! ```rust
//! use leafpress::template::TemplateEngine;
//! use serde_json::json;
//!
//! let engine = TemplateEngine::empty().with_partial("greeting", "Hello, {{ name }}!");
//! let html = engine.render("<p>{{> greeting }}</p>", &json!({ "name": "reader" })).unwrap();
//! assert_eq!(html, "<p>Hello, reader!</p>");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use log::debug;
use parking_lot::RwLock;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use walkdir::WalkDir;

use crate::{LeafpressError, Result};

/// Directory holding partial templates, relative to the source root.
pub const PARTIALS_DIR: &str = "_includes";

/// Maximum nesting of partial inclusion before markers are left as-is.
pub const MAX_PARTIAL_DEPTH: usize = 10;

const PARTIAL_EXTENSION: &str = "html";

#[allow(clippy::expect_used)]
static PARTIAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*>\s*([^\s}]+)\s*\}\}")
        .expect("partial marker pattern is valid")
});

#[allow(clippy::expect_used)]
static VARIABLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^\s}]+)\s*\}\}")
        .expect("variable marker pattern is valid")
});

/// Logical partial names mapped to files, built from one directory scan.
#[derive(Debug, Clone, Default)]
pub struct PartialIndex {
    paths: HashMap<String, PathBuf>,
}

impl PartialIndex {
    /// Scans `<source_dir>/_includes` for `.html` files.
    ///
    /// A partial's name is its path relative to the partials directory,
    /// with forward slashes and without the extension. A missing
    /// directory yields an empty index.
    pub fn scan(source_dir: &Path) -> Self {
        let root = source_dir.join(PARTIALS_DIR);
        let mut paths = HashMap::new();

        if !root.is_dir() {
            return Self { paths };
        }

        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let is_html = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(PARTIAL_EXTENSION));
            if !is_html {
                continue;
            }
            if let Some(name) = logical_name(&root, path) {
                _ = paths.insert(name, path.to_path_buf());
            }
        }

        debug!("Indexed {} partial(s) in {}", paths.len(), root.display());
        Self { paths }
    }

    /// Resolves a partial name to its file, if one exists.
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    /// Number of indexed partials.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Relative path of `path` under `root`, without extension, `/`-separated.
pub(crate) fn logical_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    (!name.is_empty()).then_some(name)
}

/// Renders template text against a JSON context.
///
/// Partial text is read at most once per engine and shared between
/// renders, so one engine should live for exactly one build.
#[derive(Clone)]
pub struct TemplateEngine {
    index: PartialIndex,
    cache: Arc<RwLock<HashMap<String, Arc<str>>>>,
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("partials", &self.index.len())
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl TemplateEngine {
    /// Creates an engine resolving partials under `source_dir`.
    pub fn new(source_dir: &Path) -> Self {
        Self::with_index(PartialIndex::scan(source_dir))
    }

    /// Creates an engine over a prepared partial index.
    pub fn with_index(index: PartialIndex) -> Self {
        Self {
            index,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates an engine with no partials on disk.
    pub fn empty() -> Self {
        Self::with_index(PartialIndex::default())
    }

    /// Registers an in-memory partial, taking precedence over files.
    pub fn with_partial(self, name: &str, template: &str) -> Self {
        _ = self
            .cache
            .write()
            .insert(name.to_string(), Arc::from(template));
        self
    }

    /// Renders `template` with `context`.
    ///
    /// # Arguments
    ///
    /// * `template` - Template text containing partial and variable markers
    /// * `context` - Object walked by dotted variable keys
    ///
    /// # Returns
    ///
    /// The rendered text, or an error if a partial file exists but
    /// cannot be read.
    pub fn render(&self, template: &str, context: &JsonValue) -> Result<String> {
        let expanded = self.expand_partials(template)?;
        Ok(interpolate(&expanded, context))
    }

    /// Expands partial markers until none remain or the depth limit is hit.
    ///
    /// Markers still present after the last round are left in the text.
    pub fn expand_partials(&self, template: &str) -> Result<String> {
        let mut text = template.to_string();

        for _ in 0..=MAX_PARTIAL_DEPTH {
            if !PARTIAL_MARKER.is_match(&text) {
                return Ok(text);
            }

            let mut output = String::with_capacity(text.len());
            let mut last = 0;
            for caps in PARTIAL_MARKER.captures_iter(&text) {
                let (Some(marker), Some(name)) = (caps.get(0), caps.get(1))
                else {
                    continue;
                };
                output.push_str(&text[last..marker.start()]);
                if let Some(partial) = self.partial(name.as_str())? {
                    output.push_str(&partial);
                }
                last = marker.end();
            }
            output.push_str(&text[last..]);
            text = output;
        }

        if PARTIAL_MARKER.is_match(&text) {
            debug!(
                "Partial nesting exceeded {} levels; leaving markers in place",
                MAX_PARTIAL_DEPTH
            );
        }
        Ok(text)
    }

    /// Returns the text of a partial, reading and caching it on first use.
    ///
    /// A partial that does not exist resolves to `None`.
    fn partial(&self, name: &str) -> Result<Option<Arc<str>>> {
        if let Some(cached) = self.cache.read().get(name) {
            return Ok(Some(Arc::clone(cached)));
        }

        let Some(path) = self.index.resolve(name) else {
            debug!("Partial '{}' not found; inserting nothing", name);
            return Ok(None);
        };

        let text: Arc<str> = fs::read_to_string(path)
            .map_err(|e| {
                LeafpressError::template_rendering_error(
                    format!("Failed to read partial: {}", e),
                    name.to_string(),
                    Some(Box::new(e)),
                )
            })?
            .into();

        _ = self
            .cache
            .write()
            .insert(name.to_string(), Arc::clone(&text));
        Ok(Some(text))
    }
}

/// Replaces every variable marker with its stringified context value.
pub fn interpolate(template: &str, context: &JsonValue) -> String {
    VARIABLE_MARKER
        .replace_all(template, |caps: &Captures<'_>| {
            lookup(context, &caps[1]).map(stringify).unwrap_or_default()
        })
        .into_owned()
}

/// Walks `context` through each dot-separated segment of `key`.
///
/// Objects are indexed by name and arrays by numeric position. Any
/// missing or null step yields `None`.
pub fn lookup<'a>(context: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    let mut current = context;
    for segment in key.split('.') {
        current = match current {
            JsonValue::Object(map) => map.get(segment)?,
            JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Converts a context value to the text inserted into a template.
///
/// Strings are verbatim, numbers and booleans in display form, arrays are
/// comma-joined element strings, objects are compact JSON and null is
/// empty.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(flag) => flag.to_string(),
        JsonValue::Number(number) => number.to_string(),
        JsonValue::String(text) => text.clone(),
        JsonValue::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => value.to_string(),
    }
}
