// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # RSS Feed Generation
//!
//! One `<item>` per published post, in listing order, built with the
//! `rss` crate.

use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::content::Entry;
use crate::core::traits::Generator;
use crate::generators::FeedSource;
use crate::Result;

/// Output file name.
pub const RSS_FILE: &str = "rss.xml";

/// Value of the channel `<generator>` element.
pub const GENERATOR_NAME: &str = "leafpress";

/// Produces `rss.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RssGenerator;

impl RssGenerator {
    /// Convert an entry to an RSS item.
    ///
    /// The publication date is the entry's date, else the build time.
    pub fn item(entry: &Entry, source: &FeedSource<'_>) -> Item {
        let link = source.entry_link(entry);
        let published = entry
            .date
            .as_ref()
            .map_or(source.build_time, |d| d.instant);
        let description = (!entry.summary.is_empty()).then(|| entry.summary.clone());

        ItemBuilder::default()
            .title(entry.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(description)
            .pub_date(published.to_rfc2822())
            .build()
    }
}

impl Generator for RssGenerator {
    fn file_name(&self) -> &str {
        RSS_FILE
    }

    fn generate(&self, source: &FeedSource<'_>) -> Result<Option<String>> {
        let items: Vec<Item> = source
            .published_posts()
            .map(|entry| Self::item(entry, source))
            .collect();

        let channel = ChannelBuilder::default()
            .title(source.site.title.as_str())
            .link(source.site.absolute_url("/"))
            .description(source.site.description.as_str())
            .generator(Some(GENERATOR_NAME.to_string()))
            .items(items)
            .build();

        Ok(Some(channel.to_string()))
    }
}
