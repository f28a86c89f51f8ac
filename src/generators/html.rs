// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # HTML Output Generation
//!
//! Writes finished pages to the output tree, optionally minified with
//! the `minify-html` crate.
//!
//! ```rust,no_run
//! use leafpress::generators::html::HtmlGenerator;
//! use std::path::Path;
//!
//! let generator = HtmlGenerator::new().with_minification(true);
//! generator
//!     .write_page(Path::new("html"), Path::new("about/index.html"), "<p>About</p>")
//!     .unwrap();
//! ```

use std::path::Path;

use log::trace;
use minify_html::{minify, Cfg};

use crate::output::write_file;
use crate::{LeafpressError, Result};

/// Page writer with optional minification.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlGenerator {
    minify: bool,
}

impl HtmlGenerator {
    /// Creates a writer that outputs pages exactly as rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables HTML minification.
    pub fn with_minification(mut self, enable: bool) -> Self {
        self.minify = enable;
        self
    }

    /// Whether pages are minified before writing.
    pub fn minifies(&self) -> bool {
        self.minify
    }

    /// Applies output post-processing to a rendered page bound for
    /// `target`.
    pub fn finalize(&self, html: &str, target: &Path) -> Result<String> {
        if self.minify {
            minify_html(html, target)
        } else {
            Ok(html.to_string())
        }
    }

    /// Writes a page to `output_root/relative_path`, replacing any
    /// existing file.
    ///
    /// # Arguments
    ///
    /// * `output_root` - The output directory
    /// * `relative_path` - The page's path relative to `output_root`
    /// * `html` - The rendered page
    pub fn write_page(
        &self,
        output_root: &Path,
        relative_path: &Path,
        html: &str,
    ) -> Result<()> {
        let target = output_root.join(relative_path);
        let content = self.finalize(html, &target)?;
        write_file(&target, content)?;
        trace!("Wrote {}", target.display());
        Ok(())
    }
}

/// Minifies HTML content using the `minify-html` crate.
fn minify_html(content: &str, target: &Path) -> Result<String> {
    let cfg = Cfg {
        minify_css: true,
        minify_js: true,
        ..Cfg::default()
    };
    minified_text(minify(content.as_bytes(), &cfg), target)
}

fn minified_text(bytes: Vec<u8>, target: &Path) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        LeafpressError::output_generation_error(
            "HTML minification produced invalid UTF-8",
            target.to_path_buf(),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = "<html>\n  <body>\n    <p>Hello   World</p>\n  </body>\n</html>\n";

    #[test]
    fn test_write_page_verbatim() {
        let dir = TempDir::new().unwrap();
        let generator = HtmlGenerator::new();
        generator
            .write_page(dir.path(), Path::new("a/index.html"), PAGE)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("a/index.html")).unwrap(),
            PAGE
        );
        assert!(!generator.minifies());
    }

    #[test]
    fn test_minification() {
        let generator = HtmlGenerator::new().with_minification(true);
        let result = generator.finalize(PAGE, Path::new("index.html")).unwrap();
        assert!(result.len() < PAGE.len());
        assert!(result.contains("Hello World"));
        assert!(!result.contains("\n    "));
    }

    #[test]
    fn test_invalid_minified_output_names_the_page() {
        let err = minified_text(vec![0xff, 0xfe], Path::new("html/about/index.html"))
            .unwrap_err();
        match err {
            LeafpressError::OutputGenerationError { path, .. } => {
                assert_eq!(path, Path::new("html/about/index.html"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
