// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Content Loading Module
//!
//! Walks the source tree and turns each Markdown or HTML file into an
//! [`Entry`]. Every other file is copied byte-for-byte to the mirrored
//! location in the output tree.
//!
//! ## Key Features
//!
//! - **Reserved paths**: any path segment starting with `_` is skipped,
//!   which keeps layouts, partials and data files out of the output
//! - **Deterministic walk**: directories are visited sorted by file name
//! - **Date inference**: a `YYYY-MM-DD-` or `YYYY-MM-` file name prefix
//!   supplies the date when the header has none
//! - **Post ordering**: [`sort_posts`] gives the total order used by
//!   listings and feeds

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::core::traits::MarkdownConverter;
use crate::output;
use crate::paths::{base_name, compute_output_path, compute_url, is_post_path};
use crate::processors::frontmatter::{
    metadata_flag, metadata_str, parse_front_matter, Metadata,
};
use crate::{LeafpressError, Result};

/// Leading character that hides a file or directory from publishing.
pub const RESERVED_PREFIX: char = '_';

/// Extension of Markdown sources.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Extension of HTML sources.
pub const HTML_EXTENSION: &str = "html";

#[allow(clippy::expect_used)]
static FILENAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}(?:-\d{2})?)-").expect("file name date pattern is valid")
});

#[allow(clippy::expect_used)]
static FILENAME_DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-(?:\d{2}-)?").expect("date prefix pattern is valid")
});

#[allow(clippy::expect_used)]
static YEAR_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})$").expect("year-month pattern is valid")
});

#[allow(clippy::expect_used)]
static YEAR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("year pattern is valid"));

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A parsed entry date with its cached string forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDate {
    /// The instant, in UTC.
    pub instant: DateTime<Utc>,
    /// `YYYY-MM-DD`.
    pub iso: String,
    /// `Mon DD, YYYY`.
    pub human: String,
}

impl EntryDate {
    /// Derives both string forms from `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            iso: instant.format("%Y-%m-%d").to_string(),
            human: instant.format("%b %d, %Y").to_string(),
        }
    }
}

/// One processed source content file.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Absolute path of the source file.
    pub source_path: PathBuf,
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// Lower-case extension without the dot.
    pub extension: String,
    /// Parsed header fields.
    pub metadata: Metadata,
    /// Body as HTML (Markdown converted, HTML passed through).
    pub html_content: String,
    /// `summary` or `description` from the header, else empty.
    pub summary: String,
    /// Raw date value from the header or the file name.
    pub date_raw: Option<String>,
    /// Parsed date; absent when missing or unparseable.
    pub date: Option<EntryDate>,
    /// Header `slug`, else the base name without its date prefix.
    pub slug: String,
    /// Whether the file lives under `posts/`.
    pub is_post: bool,
    /// Output path relative to the output root.
    pub output_path: PathBuf,
    /// Root-relative public URL, without the site base path.
    pub url_path: String,
    /// Header `title`, else the slug.
    pub title: String,
    /// Excluded from feeds when set.
    pub draft: bool,
    /// Source modification time.
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    /// Builds an entry from a source file's text.
    ///
    /// # Arguments
    ///
    /// * `source_path` - Absolute path of the file
    /// * `relative_path` - Path relative to the source root
    /// * `raw` - The file's full text
    /// * `markdown` - Converter applied to `.md` bodies
    pub fn parse(
        source_path: &Path,
        relative_path: &Path,
        raw: &str,
        markdown: &MarkdownConverter,
    ) -> Result<Self> {
        let extension = extension_of(relative_path);
        let parsed = parse_front_matter(raw);
        let metadata = parsed.data;

        let base = base_name(relative_path, &extension);
        let date_raw = metadata_str(&metadata, "date").or_else(|| infer_date(&base));
        let date = date_raw
            .as_deref()
            .and_then(parse_date)
            .map(EntryDate::new);

        let slug = metadata_str(&metadata, "slug")
            .unwrap_or_else(|| FILENAME_DATE_PREFIX.replace(&base, "").into_owned());
        let is_post = is_post_path(relative_path);

        let output_path =
            compute_output_path(relative_path, &extension, &metadata, is_post, &slug);
        let url_path = compute_url(Path::new(""), &output_path);

        let html_content = if extension == MARKDOWN_EXTENSION {
            markdown.transform(parsed.content).map_err(|e| {
                LeafpressError::content_processing_error(
                    format!("Failed to convert {}", relative_path.display()),
                    Some(Box::new(e)),
                )
            })?
        } else {
            parsed.content
        };

        let summary = metadata_str(&metadata, "summary")
            .or_else(|| metadata_str(&metadata, "description"))
            .unwrap_or_default();
        let title = metadata_str(&metadata, "title").unwrap_or_else(|| slug.clone());
        let draft = metadata_flag(&metadata, "draft");
        let modified = fs::metadata(source_path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(Self {
            source_path: source_path.to_path_buf(),
            relative_path: relative_path.to_path_buf(),
            extension,
            metadata,
            html_content,
            summary,
            date_raw,
            date,
            slug,
            is_post,
            output_path,
            url_path,
            title,
            draft,
            modified,
        })
    }

    /// Layout named by the header, else the default for the extension.
    pub fn layout_name(&self, default_layout: &str) -> Option<String> {
        metadata_str(&self.metadata, "layout").or_else(|| {
            (self.extension == MARKDOWN_EXTENSION).then(|| default_layout.to_string())
        })
    }

    /// The entry's date, else its modification time.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.date.as_ref().map(|d| d.instant).or(self.modified)
    }
}

/// Result of walking the source tree.
#[derive(Debug, Default)]
pub struct LoadedContent {
    /// Content entries in walk order.
    pub entries: Vec<Entry>,
    /// Number of files copied through unchanged.
    pub copied: usize,
}

/// Walks `source_dir`, parsing content files and copying the rest.
///
/// `output_dir` receives the copied files; when it lies inside the
/// source tree it is skipped by the walk. Both paths should be absolute.
pub fn load_content(
    source_dir: &Path,
    output_dir: &Path,
    markdown: &MarkdownConverter,
) -> Result<LoadedContent> {
    let mut loaded = LoadedContent::default();

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (!is_reserved(e) && e.path() != output_dir));

    for item in walker {
        let item = item.map_err(|e| {
            LeafpressError::content_processing_error(
                format!("Failed to walk {}", source_dir.display()),
                Some(Box::new(e)),
            )
        })?;
        if !item.file_type().is_file() {
            continue;
        }

        let path = item.path();
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };

        if is_content_file(relative) {
            let raw = output::read_to_string(path)?;
            let entry = Entry::parse(path, relative, &raw, markdown)?;
            debug!(
                "Loaded {} -> {}",
                relative.display(),
                entry.output_path.display()
            );
            loaded.entries.push(entry);
        } else {
            output::copy_file(path, output_dir.join(relative))?;
            debug!("Copied {}", relative.display());
            loaded.copied += 1;
        }
    }

    info!(
        "Loaded {} entries, copied {} file(s)",
        loaded.entries.len(),
        loaded.copied
    );
    Ok(loaded)
}

fn is_reserved(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_string_lossy()
        .starts_with(RESERVED_PREFIX)
}

/// Whether a relative path names a Markdown or HTML source.
pub fn is_content_file(relative_path: &Path) -> bool {
    matches!(
        extension_of(relative_path).as_str(),
        MARKDOWN_EXTENSION | HTML_EXTENSION
    )
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Extracts a `YYYY-MM-DD` or `YYYY-MM` prefix followed by `-`.
pub fn infer_date(base_name: &str) -> Option<String> {
    FILENAME_DATE
        .captures(base_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses a date value from a header or file name.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD[ T]HH:MM[:SS]` (taken as
/// UTC), `YYYY-MM-DD`, `YYYY-MM` (first of the month) and `YYYY`
/// (January 1st). Invalid calendar dates yield `None`.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Some(caps) = YEAR_MONTH.captures(value) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }
    if YEAR_ONLY.is_match(value) {
        return NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }
    None
}

/// Compares two posts: dated before undated, newer dates first, undated
/// by slug. Remaining ties fall back to slug, then source path.
pub fn compare_posts(a: &Entry, b: &Entry) -> Ordering {
    let by_date = match (&a.date, &b.date) {
        (Some(x), Some(y)) => y.instant.cmp(&x.instant),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.slug.cmp(&b.slug))
        .then_with(|| a.relative_path.cmp(&b.relative_path))
}

/// Returns the post subset of `entries` in listing order.
pub fn sort_posts(entries: &[Entry]) -> Vec<&Entry> {
    let mut posts: Vec<&Entry> = entries.iter().filter(|e| e.is_post).collect();
    posts.sort_by(|a, b| compare_posts(a, b));
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::MarkdownProcessor;
    use tempfile::TempDir;

    fn entry(relative: &str, raw: &str) -> Entry {
        let processor = MarkdownProcessor::new();
        let rel = Path::new(relative);
        Entry::parse(&Path::new("/nonexistent").join(rel), rel, raw, &processor).unwrap()
    }

    #[test]
    fn test_post_from_dated_filename() {
        let e = entry("posts/2026-01-15-my-post.md", "Hello *there*.\n");
        assert!(e.is_post);
        assert_eq!(e.slug, "my-post");
        assert_eq!(e.title, "my-post");
        assert_eq!(e.date_raw.as_deref(), Some("2026-01-15"));
        let date = e.date.unwrap();
        assert_eq!(date.iso, "2026-01-15");
        assert_eq!(date.human, "Jan 15, 2026");
        assert_eq!(e.output_path, PathBuf::from("posts/my-post/index.html"));
        assert_eq!(e.url_path, "/posts/my-post/");
        assert!(e.html_content.contains("<em>there</em>"));
        assert!(e.modified.is_none());
    }

    #[test]
    fn test_header_overrides() {
        let e = entry(
            "posts/2024-02-01-ignored.md",
            "---\ntitle: Custom\nslug: chosen\ndate: 2023-06-15\ndescription: About it\ndraft: true\n---\nBody\n",
        );
        assert_eq!(e.title, "Custom");
        assert_eq!(e.slug, "chosen");
        assert_eq!(e.date.as_ref().unwrap().iso, "2023-06-15");
        assert_eq!(e.summary, "About it");
        assert!(e.draft);
        assert_eq!(e.url_path, "/posts/chosen/");
    }

    #[test]
    fn test_html_passes_through() {
        let e = entry("about.html", "<p>*not markdown*</p>");
        assert_eq!(e.html_content, "<p>*not markdown*</p>");
        assert_eq!(e.layout_name("base"), None);
        assert_eq!(e.url_path, "/about/");
    }

    #[test]
    fn test_layout_defaults() {
        assert_eq!(entry("a.md", "x").layout_name("base").as_deref(), Some("base"));
        assert_eq!(
            entry("a.md", "---\nlayout: post\n---\nx").layout_name("base").as_deref(),
            Some("post")
        );
    }

    #[test]
    fn test_year_month_prefix() {
        let e = entry("posts/2024-03-notes.md", "");
        assert_eq!(e.slug, "notes");
        assert_eq!(e.date.unwrap().iso, "2024-03-01");
    }

    #[test]
    fn test_invalid_calendar_date_is_absent() {
        let e = entry("posts/2024-13-45-bad.md", "");
        assert_eq!(e.date_raw.as_deref(), Some("2024-13-45"));
        assert!(e.date.is_none());
        assert_eq!(e.slug, "bad");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-02").unwrap().to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert_eq!(
            parse_date("2024-01-02T10:30:00+02:00").unwrap().to_rfc3339(),
            "2024-01-02T08:30:00+00:00"
        );
        assert_eq!(parse_date("2024-01-02 10:30").unwrap().to_rfc3339(), "2024-01-02T10:30:00+00:00");
        assert_eq!(
            parse_date("Tue, 02 Jan 2024 10:30:00 +0000").unwrap().to_rfc3339(),
            "2024-01-02T10:30:00+00:00"
        );
        assert_eq!(parse_date("2024").unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
        assert!(parse_date("2023-02-29").is_none());
    }

    #[test]
    fn test_post_order() {
        let entries = vec![
            entry("posts/zeta.md", ""),
            entry("posts/2023-06-15-mid.md", ""),
            entry("posts/alpha.md", ""),
            entry("posts/2024-01-01-new.md", ""),
            entry("pages/2025-01-01-not-a-post.md", ""),
        ];
        let slugs: Vec<&str> = sort_posts(&entries).iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_same_date_ties_break_by_slug() {
        let entries = vec![
            entry("posts/2024-01-01-b.md", ""),
            entry("posts/2024-01-01-a.md", ""),
        ];
        let slugs: Vec<&str> = sort_posts(&entries).iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, ["a", "b"]);
    }

    #[test]
    fn test_load_content_walk() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        for (path, text) in [
            ("index.md", "# Home"),
            ("posts/2024-01-01-first.md", "First"),
            ("_layouts/base.html", "{{ content }}"),
            ("drafts/_hidden/secret.md", "no"),
            ("assets/style.css", "body{}"),
            ("_data/site.json", "{}"),
        ] {
            let full = src.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, text).unwrap();
        }

        let processor = MarkdownProcessor::new();
        let loaded = load_content(&src, &out, &processor).unwrap();

        let rels: Vec<PathBuf> = loaded.entries.iter().map(|e| e.relative_path.clone()).collect();
        assert_eq!(
            rels,
            [PathBuf::from("index.md"), PathBuf::from("posts/2024-01-01-first.md")]
        );
        assert_eq!(loaded.copied, 1);
        assert_eq!(fs::read_to_string(out.join("assets/style.css")).unwrap(), "body{}");
        assert!(loaded.entries[0].modified.is_some());
    }

    #[test]
    fn test_output_inside_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().to_path_buf();
        let out = src.join("public");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("old.md"), "stale").unwrap();
        fs::write(src.join("page.md"), "fresh").unwrap();

        let processor = MarkdownProcessor::new();
        let loaded = load_content(&src, &out, &processor).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].slug, "page");
    }
}
