// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Path Mapping
//!
//! Derives where an entry is written and the public URL it is served
//! from. Both are pure functions of the entry's location, metadata and
//! derived slug, so rebuilding an unchanged tree yields the same layout.
//!
//! Output paths returned here are relative to the output root. URL paths
//! are root-relative and do not include the site `baseUrl` prefix; that
//! is applied when links are emitted.
//!
//! ```rust
//! use std::path::Path;
//! use leafpress::paths::{compute_output_path, compute_url};
//! use leafpress::processors::Metadata;
//!
//! let out = compute_output_path(Path::new("blog/hello.md"), "md", &Metadata::new(), false, "hello");
//! assert_eq!(out, Path::new("blog/hello/index.html"));
//! assert_eq!(compute_url(Path::new("html"), &out), "/blog/hello/");
//! ```

use std::path::{Component, Path, PathBuf};

use crate::processors::frontmatter::{metadata_str, Metadata};

/// File name every directory-style page is written to.
pub const INDEX_FILE: &str = "index.html";

/// Top-level directory holding posts, in both source and output trees.
pub const POSTS_DIR: &str = "posts";

/// Computes the output path of an entry, relative to the output root.
///
/// # Arguments
///
/// * `relative_path` - Source path relative to the source root
/// * `extension` - Source extension without the dot (`md`, `html`)
/// * `metadata` - Parsed header fields; `permalink` takes precedence
/// * `is_post` - Whether the entry lives under `posts/`
/// * `slug` - The entry's derived slug
pub fn compute_output_path(
    relative_path: &Path,
    extension: &str,
    metadata: &Metadata,
    is_post: bool,
    slug: &str,
) -> PathBuf {
    if let Some(permalink) = metadata_str(metadata, "permalink") {
        return permalink_output_path(&permalink);
    }

    if is_post {
        let slug = match normal_components(Path::new(slug.trim())) {
            safe if safe.as_os_str().is_empty() => {
                PathBuf::from(base_name(relative_path, extension))
            }
            safe => safe,
        };
        return Path::new(POSTS_DIR).join(slug).join(INDEX_FILE);
    }

    let dir = relative_path.parent().unwrap_or_else(|| Path::new(""));
    let base_name = base_name(relative_path, extension);
    if base_name == "index" {
        dir.join(INDEX_FILE)
    } else {
        dir.join(base_name).join(INDEX_FILE)
    }
}

/// Maps a `permalink` value to an output path.
///
/// The leading `/` is dropped and only plain path segments are kept, so a
/// permalink can never point outside the output root.
fn permalink_output_path(permalink: &str) -> PathBuf {
    let trimmed = permalink.trim();
    let path = normal_components(Path::new(trimmed));

    if path.as_os_str().is_empty() {
        return PathBuf::from(INDEX_FILE);
    }
    if !trimmed.ends_with('/') && trimmed.to_lowercase().ends_with(".html") {
        return path;
    }
    path.join(INDEX_FILE)
}

/// Keeps only the plain segments of `path`, dropping roots, prefixes,
/// `.` and `..`.
fn normal_components(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Returns the file name with the content extension removed.
///
/// The extension match ignores ASCII case, so `Notes.MD` yields `Notes`.
pub fn base_name(relative_path: &Path, extension: &str) -> String {
    let file_name = relative_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let suffix_len = extension.len() + 1;
    if file_name.len() > suffix_len
        && file_name.is_char_boundary(file_name.len() - suffix_len)
    {
        let (stem, suffix) = file_name.split_at(file_name.len() - suffix_len);
        if suffix.eq_ignore_ascii_case(&format!(".{}", extension)) {
            return stem.to_string();
        }
    }
    file_name
}

/// Maps an output path to its public URL.
///
/// `output_path` may be absolute under `output_root` or already relative
/// to it. `index.html` at the root maps to `/`, any other `…/index.html`
/// to its directory with a trailing slash, and everything else to the
/// literal path. Separators are always forward slashes.
pub fn compute_url(output_root: &Path, output_path: &Path) -> String {
    let relative = output_path.strip_prefix(output_root).unwrap_or(output_path);
    let rel = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if rel == INDEX_FILE {
        return "/".to_string();
    }
    match rel.strip_suffix(INDEX_FILE) {
        Some(dir) if dir.ends_with('/') => format!("/{}", dir),
        _ => format!("/{}", rel),
    }
}

/// Whether a relative source path belongs to the post collection.
pub fn is_post_path(relative_path: &Path) -> bool {
    let mut components = relative_path.components();
    matches!(components.next(), Some(Component::Normal(first)) if first == POSTS_DIR)
        && components.next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap_or_default()
    }

    fn map(rel: &str, metadata: &Metadata, is_post: bool, slug: &str) -> (PathBuf, String) {
        let rel = Path::new(rel);
        let ext = rel.extension().unwrap().to_string_lossy().into_owned();
        let out = compute_output_path(rel, &ext, metadata, is_post, slug);
        let url = compute_url(Path::new("/srv/html"), &Path::new("/srv/html").join(&out));
        (out, url)
    }

    #[test]
    fn test_permalink_trailing_slash() {
        let (out, url) = map("about.md", &meta(json!({"permalink": "/about/"})), false, "about");
        assert_eq!(out, PathBuf::from("about/index.html"));
        assert_eq!(url, "/about/");
    }

    #[test]
    fn test_permalink_html_file() {
        let (out, url) = map("feed.md", &meta(json!({"permalink": "/feed.html"})), false, "feed");
        assert_eq!(out, PathBuf::from("feed.html"));
        assert_eq!(url, "/feed.html");
    }

    #[test]
    fn test_permalink_bare_directory() {
        let (out, url) = map("x.md", &meta(json!({"permalink": "/x"})), false, "x");
        assert_eq!(out, PathBuf::from("x/index.html"));
        assert_eq!(url, "/x/");
    }

    #[test]
    fn test_permalink_overrides_post_rule() {
        let (out, _) = map(
            "posts/2024-01-01-a.md",
            &meta(json!({"permalink": "/archive/a/"})),
            true,
            "a",
        );
        assert_eq!(out, PathBuf::from("archive/a/index.html"));
    }

    #[test]
    fn test_permalink_root_and_traversal() {
        let (out, url) = map("home.md", &meta(json!({"permalink": "/"})), false, "home");
        assert_eq!(out, PathBuf::from("index.html"));
        assert_eq!(url, "/");

        let (out, _) = map("evil.md", &meta(json!({"permalink": "/../../etc/"})), false, "evil");
        assert_eq!(out, PathBuf::from("etc/index.html"));
    }

    #[test]
    fn test_post_slug_stays_under_posts() {
        let (out, url) = map("posts/a.md", &Metadata::new(), true, "../../../outside");
        assert_eq!(out, PathBuf::from("posts/outside/index.html"));
        assert_eq!(url, "/posts/outside/");

        let (out, url) = map("posts/a.md", &Metadata::new(), true, "/tmp/abs");
        assert_eq!(out, PathBuf::from("posts/tmp/abs/index.html"));
        assert_eq!(url, "/posts/tmp/abs/");
        assert!(Path::new("/srv/html").join(&out).starts_with("/srv/html"));

        let (out, _) = map("posts/2024-01-01-b.md", &Metadata::new(), true, "..");
        assert_eq!(out, PathBuf::from("posts/2024-01-01-b/index.html"));
    }

    #[test]
    fn test_default_page_rule() {
        let (out, url) = map("blog/hello.md", &Metadata::new(), false, "hello");
        assert_eq!(out, PathBuf::from("blog/hello/index.html"));
        assert_eq!(url, "/blog/hello/");
    }

    #[test]
    fn test_root_index() {
        let (out, url) = map("index.md", &Metadata::new(), false, "index");
        assert_eq!(out, PathBuf::from("index.html"));
        assert_eq!(url, "/");

        let (out, url) = map("docs/index.html", &Metadata::new(), false, "index");
        assert_eq!(out, PathBuf::from("docs/index.html"));
        assert_eq!(url, "/docs/");
    }

    #[test]
    fn test_post_rule() {
        let (out, url) = map("posts/2026-01-15-my-post.md", &Metadata::new(), true, "my-post");
        assert_eq!(out, PathBuf::from("posts/my-post/index.html"));
        assert_eq!(url, "/posts/my-post/");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let (out, _) = map("Notes.MD", &Metadata::new(), false, "Notes");
        assert_eq!(out, PathBuf::from("Notes/index.html"));
    }

    #[test]
    fn test_non_index_url() {
        let root = Path::new("html");
        assert_eq!(compute_url(root, Path::new("a/b.html")), "/a/b.html");
        assert_eq!(compute_url(root, Path::new("notindex.html")), "/notindex.html");
        assert_eq!(compute_url(root, Path::new("html/index.html")), "/");
    }

    #[test]
    fn test_is_post_path() {
        assert!(is_post_path(Path::new("posts/a.md")));
        assert!(is_post_path(Path::new("posts/2024/a.md")));
        assert!(!is_post_path(Path::new("posts.md")));
        assert!(!is_post_path(Path::new("blog/posts/a.md")));
    }
}
