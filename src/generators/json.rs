// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # JSON Post Index
//!
//! Writes `posts.json`: every published post with its HTML and a plain
//! text rendering, wrapped with a generation timestamp and basic site
//! metadata. The plain text is extracted from an `html5ever` parse so
//! entities decode and `script`/`style` bodies are dropped.

use std::path::PathBuf;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::Serialize;

use crate::content::Entry;
use crate::core::traits::Generator;
use crate::generators::FeedSource;
use crate::{LeafpressError, Result};

/// Output file name.
pub const JSON_INDEX_FILE: &str = "posts.json";

/// Elements whose text is never part of the plain rendering.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Elements that separate words even without surrounding whitespace.
const BLOCK_ELEMENTS: [&str; 22] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl",
    "dt", "figcaption", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li",
    "p", "pre", "td", "th",
];

#[derive(Debug, Serialize)]
struct JsonIndex<'a> {
    generated: String,
    site: JsonSite<'a>,
    posts: Vec<JsonPost<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSite<'a> {
    title: &'a str,
    description: &'a str,
    url: String,
}

#[derive(Debug, Serialize)]
struct JsonPost<'a> {
    title: &'a str,
    date: &'a str,
    summary: &'a str,
    url: String,
    path: String,
    slug: &'a str,
    html: &'a str,
    text: String,
}

impl<'a> JsonPost<'a> {
    fn new(entry: &'a Entry, source: &FeedSource<'_>) -> Self {
        Self {
            title: &entry.title,
            date: entry.date.as_ref().map_or("", |d| d.iso.as_str()),
            summary: &entry.summary,
            url: source.entry_link(entry),
            path: source.site.public_url(&entry.url_path),
            slug: &entry.slug,
            html: &entry.html_content,
            text: html_to_text(&entry.html_content),
        }
    }
}

/// Produces `posts.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonIndexGenerator;

impl Generator for JsonIndexGenerator {
    fn file_name(&self) -> &str {
        JSON_INDEX_FILE
    }

    fn generate(&self, source: &FeedSource<'_>) -> Result<Option<String>> {
        let index = JsonIndex {
            generated: source.build_time.to_rfc3339(),
            site: JsonSite {
                title: &source.site.title,
                description: &source.site.description,
                url: source.site.absolute_url("/"),
            },
            posts: source
                .published_posts()
                .map(|entry| JsonPost::new(entry, source))
                .collect(),
        };

        serde_json::to_string_pretty(&index)
            .map(Some)
            .map_err(|e| {
                LeafpressError::output_generation_error(
                    "Failed to serialize post index",
                    PathBuf::from(JSON_INDEX_FILE),
                    Some(Box::new(e)),
                )
            })
    }
}

/// Strips markup from an HTML fragment.
///
/// Text nodes are concatenated, block elements separate words, and runs
/// of whitespace collapse to single spaces.
///
/// ```rust
/// use leafpress::generators::json::html_to_text;
///
/// let text = html_to_text("<h1>Title</h1><p>Fish &amp; <em>chips</em></p>");
/// assert_eq!(text, "Title Fish & chips");
/// ```
pub fn html_to_text(html: &str) -> String {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut raw = String::with_capacity(html.len());
    collect_text(&dom.document, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(handle: &Handle, out: &mut String) {
    let mut block = false;
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if SKIPPED_ELEMENTS.contains(&tag) {
                return;
            }
            block = BLOCK_ELEMENTS.contains(&tag);
        }
        _ => {}
    }

    if block {
        out.push(' ');
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
    if block {
        out.push(' ');
    }
}
