// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Layout Resolution
//!
//! Wraps rendered content in a chain of layouts. A layout is an HTML file
//! with its own header block; its body is rendered with the page context
//! plus its own metadata and `content` bound to the text produced so far.
//! A layout's `layout` field names the next, outer layout.
//!
//! Layout names resolve through an index built from a single scan of
//! `_layouts/`. A name ending in `.html` is instead taken as a path
//! relative to the source root.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue};
use walkdir::WalkDir;

use crate::processors::frontmatter::{metadata_str, parse_front_matter};
use crate::template::{logical_name, TemplateEngine};
use crate::{LeafpressError, Result};

/// Directory holding layouts, relative to the source root.
pub const LAYOUTS_DIR: &str = "_layouts";

/// Layout name that disables wrapping.
pub const NO_LAYOUT: &str = "none";

/// Deepest chain position that is still applied (positions start at 0).
pub const MAX_LAYOUT_DEPTH: usize = 8;

/// Layout used for Markdown entries that do not name one.
pub const DEFAULT_LAYOUT: &str = "base";

const LAYOUT_EXTENSION: &str = "html";

/// Resolves layout names and applies layout chains.
pub struct LayoutResolver {
    source_dir: PathBuf,
    index: HashMap<String, PathBuf>,
    reported: Mutex<HashSet<String>>,
}

impl fmt::Debug for LayoutResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutResolver")
            .field("source_dir", &self.source_dir)
            .field("layouts", &self.index.len())
            .finish()
    }
}

impl LayoutResolver {
    /// Scans `<source_dir>/_layouts` once and builds the name index.
    pub fn new(source_dir: &Path) -> Self {
        let root = source_dir.join(LAYOUTS_DIR);
        let mut index = HashMap::new();

        if root.is_dir() {
            for entry in WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                let is_html = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(LAYOUT_EXTENSION));
                if let (true, Some(name)) = (is_html, logical_name(&root, path)) {
                    _ = index.insert(name, path.to_path_buf());
                }
            }
        }

        debug!("Indexed {} layout(s) in {}", index.len(), root.display());
        Self {
            source_dir: source_dir.to_path_buf(),
            index,
            reported: Mutex::new(HashSet::new()),
        }
    }

    /// Resolves a layout name to an existing file.
    ///
    /// Returns `None` for an empty name, the `none` sentinel, or a layout
    /// that does not exist.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name == NO_LAYOUT {
            return None;
        }

        if name.to_lowercase().ends_with(".html") {
            let relative: PathBuf = Path::new(name)
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            let path = self.source_dir.join(relative);
            return path.is_file().then_some(path);
        }

        self.index.get(name).cloned()
    }

    /// Wraps `content` in the layout chain starting at `layout_name`.
    ///
    /// # Arguments
    ///
    /// * `engine` - Template engine used to render each layout body
    /// * `layout_name` - First (innermost) layout, if any
    /// * `content` - Rendered page content
    /// * `context` - Page render context shared by every layout in the chain
    ///
    /// # Returns
    ///
    /// The fully wrapped HTML. A missing layout stops the chain and the
    /// content produced so far is returned unchanged.
    pub fn apply_layouts(
        &self,
        engine: &TemplateEngine,
        layout_name: Option<&str>,
        content: String,
        context: &JsonValue,
    ) -> Result<String> {
        let mut content = content;
        let mut next = layout_name.map(str::to_string);

        for depth in 0..=MAX_LAYOUT_DEPTH {
            let Some(name) = next.take() else {
                return Ok(content);
            };
            let name = name.trim();
            if name.is_empty() || name == NO_LAYOUT {
                return Ok(content);
            }

            let Some(path) = self.resolve(name) else {
                self.report_missing(name);
                return Ok(content);
            };

            let raw = fs::read_to_string(&path)
                .map_err(|e| LeafpressError::io_error(path.clone(), e))?;
            let parsed = parse_front_matter(&raw);
            let body = if parsed.content.is_empty() {
                raw.as_str()
            } else {
                parsed.content.as_str()
            };

            let scope = layout_context(context, &parsed.data, content);
            content = engine.render(body, &scope).map_err(|e| {
                LeafpressError::template_rendering_error(
                    format!("Failed to render layout at depth {}", depth),
                    name.to_string(),
                    Some(Box::new(e)),
                )
            })?;
            next = metadata_str(&parsed.data, "layout");
        }

        if next.is_some() {
            debug!(
                "Layout chain exceeded {} levels; stopping",
                MAX_LAYOUT_DEPTH + 1
            );
        }
        Ok(content)
    }

    fn report_missing(&self, name: &str) {
        if self.reported.lock().insert(name.to_string()) {
            warn!("Layout '{}' not found; content left unwrapped", name);
        }
    }
}

/// Base context overridden by layout metadata, with `content` bound.
fn layout_context(
    base: &JsonValue,
    layout_data: &Map<String, JsonValue>,
    content: String,
) -> JsonValue {
    let mut scope = match base {
        JsonValue::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in layout_data {
        _ = scope.insert(key.clone(), value.clone());
    }
    _ = scope.insert("content".to_string(), JsonValue::String(content));
    JsonValue::Object(scope)
}
