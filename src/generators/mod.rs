// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Output Generators
//!
//! Page writing and the derived artifacts produced after every page has
//! been written. Each artifact is a [`Generator`] reading the same
//! [`FeedSource`]; drafts are visible to generators but excluded by the
//! `published_*` accessors they use.
//!
//! - [`html`]: page writer with optional minification
//! - [`sitemap`]: `sitemap.xml`
//! - [`rss`]: `rss.xml`
//! - [`json`]: `posts.json`
//! - [`domain`]: `CNAME`

use chrono::{DateTime, Utc};

use crate::content::Entry;
use crate::core::site::SiteConfig;
use crate::core::traits::Generator;

/// Custom-domain marker file.
pub mod domain;
/// Page writer.
pub mod html;
/// JSON post index.
pub mod json;
/// RSS feed.
pub mod rss;
/// XML sitemap.
pub mod sitemap;

/// The assembled site as seen by artifact generators.
#[derive(Debug, Clone, Copy)]
pub struct FeedSource<'a> {
    /// Site configuration.
    pub site: &'a SiteConfig,
    /// Every entry, in walk order.
    pub entries: &'a [Entry],
    /// Posts, in listing order.
    pub posts: &'a [&'a Entry],
    /// Instant the build started.
    pub build_time: DateTime<Utc>,
}

impl<'a> FeedSource<'a> {
    /// Entries that are not drafts, in walk order.
    pub fn published_entries(&self) -> impl Iterator<Item = &'a Entry> {
        self.entries.iter().filter(|e| !e.draft)
    }

    /// Posts that are not drafts, in listing order.
    pub fn published_posts(&self) -> impl Iterator<Item = &'a Entry> {
        self.posts.iter().copied().filter(|e| !e.draft)
    }

    /// Absolute link for an entry.
    pub fn entry_link(&self, entry: &Entry) -> String {
        self.site.absolute_url(&entry.url_path)
    }
}

/// The artifacts every build emits, in the order they are written.
pub fn default_generators() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(sitemap::SitemapGenerator),
        Box::new(rss::RssGenerator),
        Box::new(json::JsonIndexGenerator),
        Box::new(domain::DomainGenerator),
    ]
}

/// Escapes the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::processors::MarkdownProcessor;
    use chrono::TimeZone;
    use std::path::Path;

    pub(crate) fn entry(relative: &str, raw: &str) -> Entry {
        let rel = Path::new(relative);
        Entry::parse(rel, rel, raw, &MarkdownProcessor::new()).unwrap()
    }

    pub(crate) fn build_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
    }

    pub(crate) fn site() -> SiteConfig {
        SiteConfig {
            title: "Notes & Things".into(),
            description: "Small <writing>".into(),
            url: "https://example.com/".into(),
            base_url: "/blog".into(),
            ..Default::default()
        }
    }

    pub(crate) fn sample_entries() -> Vec<Entry> {
        vec![
            entry("index.md", "# Home"),
            entry(
                "posts/2024-01-01-new-year.md",
                "---\ntitle: New Year\nsummary: Fish & Chips\n---\n<p>Hello <b>there</b></p>\n",
            ),
            entry("posts/2023-06-15-midsummer.md", "Midsummer"),
            entry("posts/secret.md", "---\ndraft: true\n---\nhidden"),
        ]
    }
}
