// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Sitemap Generation
//!
//! One `<url>` per published entry, in walk order:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::core::traits::Generator;
use crate::generators::{escape_xml, FeedSource};
use crate::Result;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Output file name.
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Single URL entry in the sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    /// Full URL location
    pub loc: String,
    /// Last modification date (`YYYY-MM-DD`), if known
    pub lastmod: Option<String>,
}

/// Produces `sitemap.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapGenerator;

impl SitemapGenerator {
    /// Collects the URL entries for `source`.
    pub fn urls(source: &FeedSource<'_>) -> Vec<UrlEntry> {
        source
            .published_entries()
            .map(|entry| UrlEntry {
                loc: source.entry_link(entry),
                lastmod: entry
                    .last_modified()
                    .map(|t| t.format("%Y-%m-%d").to_string()),
            })
            .collect()
    }

    /// Generate sitemap XML string.
    pub fn to_xml(urls: &[UrlEntry]) -> String {
        let mut xml = String::with_capacity(128 + urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = &entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

impl Generator for SitemapGenerator {
    fn file_name(&self) -> &str {
        SITEMAP_FILE
    }

    fn generate(&self, source: &FeedSource<'_>) -> Result<Option<String>> {
        Ok(Some(Self::to_xml(&Self::urls(source))))
    }
}
