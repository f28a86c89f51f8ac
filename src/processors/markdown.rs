// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Markdown Processing Module
//!
//! Converts Markdown bodies to HTML with `pulldown-cmark`. Extensions are
//! toggled per processor; tables and strikethrough are on by default,
//! footnotes are off. Headings do not get generated ids.
//!
//! ## Example Usage
//!
//! ```rust
//! use leafpress::processors::markdown::MarkdownProcessor;
//! use leafpress::core::traits::Transform;
//!
//! let processor = MarkdownProcessor::new()
//!     .with_tables(true)
//!     .with_footnotes(false);
//!
//! let html = processor.transform("# Hello\n\nThis is **bold**.".to_string()).unwrap();
//! assert!(html.contains("<h1>Hello</h1>"));
//! assert!(html.contains("<strong>bold</strong>"));
//! ```

use pulldown_cmark::{html, Options as MarkdownOptions, Parser};

use crate::core::{config::MarkdownConfig, error::Result, traits::Transform};

/// Markdown-to-HTML converter backed by `pulldown-cmark`.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownProcessor {
    options: MarkdownOptions,
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownProcessor {
    /// Creates a processor with tables and strikethrough enabled.
    pub fn new() -> Self {
        Self {
            options: MarkdownOptions::empty(),
        }
        .with_tables(true)
        .with_strikethrough(true)
    }

    /// Creates a processor from the `[markdown]` section of the build config.
    pub fn from_config(config: &MarkdownConfig) -> Self {
        Self {
            options: MarkdownOptions::empty(),
        }
        .with_tables(config.tables)
        .with_strikethrough(config.strikethrough)
        .with_footnotes(config.footnotes)
    }

    /// Enables table support in Markdown processing.
    pub fn with_tables(self, enable: bool) -> Self {
        self.toggle(MarkdownOptions::ENABLE_TABLES, enable)
    }

    /// Enables strikethrough support in Markdown processing.
    pub fn with_strikethrough(self, enable: bool) -> Self {
        self.toggle(MarkdownOptions::ENABLE_STRIKETHROUGH, enable)
    }

    /// Enables footnote support in Markdown processing.
    pub fn with_footnotes(self, enable: bool) -> Self {
        self.toggle(MarkdownOptions::ENABLE_FOOTNOTES, enable)
    }

    fn toggle(mut self, flag: MarkdownOptions, enable: bool) -> Self {
        if enable {
            self.options.insert(flag);
        } else {
            self.options.remove(flag);
        }
        self
    }

    /// Renders Markdown text to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

impl Transform for MarkdownProcessor {
    type Input = String;
    type Output = String;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(self.render(&input))
    }
}
