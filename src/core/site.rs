// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Site Data
//!
//! The site configuration (`_data/site.json`) and the idea list
//! (`_data/ideas.json`). Both are loaded once per build into immutable
//! values and handed to the assembler by reference.
//!
//! Neither file is required. A file that cannot be read or parsed is
//! reported with a warning and replaced by its default, so a typo in
//! site data never stops a build. Inside `site.json`, a recognised key
//! holding something other than a string is skipped with a warning and
//! the remaining keys still apply.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Directory holding site data files, relative to the source root.
pub const DATA_DIR: &str = "_data";
/// Site configuration file name inside [`DATA_DIR`].
pub const SITE_FILE: &str = "site.json";
/// Idea list file name inside [`DATA_DIR`].
pub const IDEAS_FILE: &str = "ideas.json";

const IDEAS_PLACEHOLDER: &str = "No ideas yet.";

/// Process-wide site configuration.
///
/// Unknown keys are kept in `extra` and exposed to templates as
/// `site.<key>` alongside the recognised ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, JsonValue>")]
pub struct SiteConfig {
    /// Site title, used when a page has none.
    pub title: String,

    /// Site description, used when a page has none.
    pub description: String,

    /// URL path prefix applied to every generated link (for example `/blog`).
    pub base_url: String,

    /// Absolute origin used for feed links (for example `https://example.com`).
    pub url: String,

    /// Custom domain. Also emitted as the `CNAME` marker file.
    pub domain: String,

    /// Pass-through keys.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            base_url: String::new(),
            url: String::new(),
            domain: String::new(),
            extra: Map::new(),
        }
    }
}

impl SiteConfig {
    /// Loads `_data/site.json` from `source_dir`, falling back to defaults.
    pub fn load(source_dir: &Path) -> Self {
        let path = source_dir.join(DATA_DIR).join(SITE_FILE);
        if !path.is_file() {
            debug!("No {} found; using default site configuration", path.display());
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
                warn!("Invalid {}: {}; using defaults.", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!("Unable to read {}: {}; using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parses a site configuration from JSON text.
    ///
    /// Fails only when the text is not a JSON object.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// The base path prefix without a trailing slash (`""` when unset).
    pub fn base_path(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Prefixes a root-relative URL path with the configured base path.
    ///
    /// ```
    /// use leafpress::core::site::SiteConfig;
    ///
    /// let site = SiteConfig { base_url: "/blog/".into(), ..Default::default() };
    /// assert_eq!(site.public_url("/posts/hello/"), "/blog/posts/hello/");
    /// ```
    pub fn public_url(&self, url_path: &str) -> String {
        format!("{}{}", self.base_path(), url_path)
    }

    /// The absolute origin for feeds: `url`, else `https://<domain>`, else empty.
    pub fn site_root(&self) -> String {
        let url = self.url.trim().trim_end_matches('/');
        if !url.is_empty() {
            return url.to_string();
        }
        let domain = self.domain.trim();
        if domain.is_empty() {
            String::new()
        } else {
            format!("https://{}", domain.trim_end_matches('/'))
        }
    }

    /// Joins the site root, base path and URL path into an absolute link.
    pub fn absolute_url(&self, url_path: &str) -> String {
        format!("{}{}", self.site_root(), self.public_url(url_path))
    }
}

impl From<Map<String, JsonValue>> for SiteConfig {
    fn from(mut map: Map<String, JsonValue>) -> Self {
        let mut site = Self::default();
        let fields = [
            ("title", &mut site.title),
            ("description", &mut site.description),
            ("baseUrl", &mut site.base_url),
            ("url", &mut site.url),
            ("domain", &mut site.domain),
        ];
        for (key, field) in fields {
            match map.remove(key) {
                None => {}
                Some(JsonValue::String(text)) => *field = text,
                Some(other) => warn!(
                    "Ignoring {} key `{}`: expected a string, found {}",
                    SITE_FILE, key, other
                ),
            }
        }
        site.extra = map;
        site
    }
}

/// One item of the idea list: a bare string or a titled note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Idea {
    /// A plain one-line idea.
    Text(String),
    /// An idea with a title and an optional note.
    Note {
        /// Short title.
        title: String,
        /// Free-form note shown after the title.
        #[serde(default)]
        note: String,
    },
}

/// Loads `_data/ideas.json`; a missing or malformed file yields an empty list.
pub fn load_ideas(source_dir: &Path) -> Vec<Idea> {
    let path = source_dir.join(DATA_DIR).join(IDEAS_FILE);
    if !path.is_file() {
        return Vec::new();
    }

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            serde_json::from_str::<Vec<Idea>>(&raw).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(ideas) => ideas,
        Err(e) => {
            warn!("Invalid {}: {}; using an empty list.", path.display(), e);
            Vec::new()
        }
    }
}

/// Renders the idea list as `<li>` items, one per line.
///
/// An empty list renders a single placeholder item so templates always
/// have something to show.
pub fn render_ideas(ideas: &[Idea]) -> String {
    if ideas.is_empty() {
        return format!("<li class=\"placeholder\">{}</li>", IDEAS_PLACEHOLDER);
    }

    ideas
        .iter()
        .map(|idea| match idea {
            Idea::Text(text) => format!("<li>{}</li>", escape_html(text)),
            Idea::Note { title, note } if note.trim().is_empty() => {
                format!("<li><strong>{}</strong></li>", escape_html(title))
            }
            Idea::Note { title, note } => format!(
                "<li><strong>{}</strong> <span>{}</span></li>",
                escape_html(title),
                escape_html(note)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn default_title() -> String {
    "Leafpress".to_string()
}

fn default_description() -> String {
    "A minimal, readable publishing pipeline.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_data(dir: &TempDir, name: &str, content: &str) {
        let data = dir.path().join(DATA_DIR);
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join(name), content).unwrap();
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let site = SiteConfig::load(dir.path());
        assert_eq!(site, SiteConfig::default());
        assert_eq!(site.title, "Leafpress");
    }

    #[test]
    fn test_load_with_extra_keys() {
        let dir = TempDir::new().unwrap();
        write_data(
            &dir,
            SITE_FILE,
            r#"{"title": "Notes", "baseUrl": "/notes", "author": "J. Doe"}"#,
        );

        let site = SiteConfig::load(dir.path());
        assert_eq!(site.title, "Notes");
        assert_eq!(site.base_url, "/notes");
        assert_eq!(site.description, default_description());
        assert_eq!(site.extra.get("author"), Some(&JsonValue::from("J. Doe")));
    }

    #[test]
    fn test_malformed_site_file_falls_back() {
        let dir = TempDir::new().unwrap();
        write_data(&dir, SITE_FILE, "{ not json");
        assert_eq!(SiteConfig::load(dir.path()), SiteConfig::default());
    }

    #[test]
    fn test_mistyped_keys_keep_the_rest() {
        let site = SiteConfig::from_json(
            r#"{"title": 42, "baseUrl": null, "url": "https://example.org", "author": "Ada"}"#,
        )
        .unwrap();

        assert_eq!(site.title, default_title());
        assert_eq!(site.base_url, "");
        assert_eq!(site.url, "https://example.org");
        assert_eq!(site.extra.get("author"), Some(&JsonValue::from("Ada")));
        assert!(!site.extra.contains_key("title"));
        assert!(!site.extra.contains_key("baseUrl"));
    }

    #[test]
    fn test_null_base_url_on_disk_keeps_title() {
        let dir = TempDir::new().unwrap();
        write_data(&dir, SITE_FILE, r#"{"title": "Notes", "baseUrl": null}"#);

        let site = SiteConfig::load(dir.path());
        assert_eq!(site.title, "Notes");
        assert_eq!(site.base_url, "");
    }

    #[test]
    fn test_non_object_site_file_is_rejected() {
        assert!(SiteConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let site = SiteConfig {
            base_url: "/x".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&site).unwrap();
        assert_eq!(value["baseUrl"], "/x");
    }

    #[test]
    fn test_site_root_and_urls() {
        let mut site = SiteConfig {
            url: "https://example.com/".into(),
            base_url: "/blog".into(),
            ..Default::default()
        };
        assert_eq!(site.site_root(), "https://example.com");
        assert_eq!(
            site.absolute_url("/posts/a/"),
            "https://example.com/blog/posts/a/"
        );

        site.url.clear();
        site.domain = "notes.example.org".into();
        assert_eq!(site.site_root(), "https://notes.example.org");

        site.domain.clear();
        assert_eq!(site.absolute_url("/"), "/blog/");
    }

    #[test]
    fn test_load_ideas_mixed() {
        let dir = TempDir::new().unwrap();
        write_data(
            &dir,
            IDEAS_FILE,
            r#"["Plain idea", {"title": "Titled", "note": "with a note"}, {"title": "Bare"}]"#,
        );

        let ideas = load_ideas(dir.path());
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0], Idea::Text("Plain idea".into()));

        let html = render_ideas(&ideas);
        assert_eq!(
            html,
            "<li>Plain idea</li>\n<li><strong>Titled</strong> <span>with a note</span></li>\n<li><strong>Bare</strong></li>"
        );
    }

    #[test]
    fn test_malformed_ideas_yield_placeholder() {
        let dir = TempDir::new().unwrap();
        write_data(&dir, IDEAS_FILE, "[1, 2");
        let ideas = load_ideas(dir.path());
        assert!(ideas.is_empty());
        assert_eq!(
            render_ideas(&ideas),
            "<li class=\"placeholder\">No ideas yet.</li>"
        );
    }

    #[test]
    fn test_idea_text_is_escaped() {
        let html = render_ideas(&[Idea::Text("a < b & c".into())]);
        assert_eq!(html, "<li>a &lt; b &amp; c</li>");
    }
}
