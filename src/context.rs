// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Render Context
//!
//! Typed values assembled before rendering. [`SharedContext`] holds what
//! every page sees (site data, the post list, ideas, the build year) and
//! is serialized once per build; [`RenderContext`] overlays one entry's
//! fields. Conversion to the dynamic JSON object the template engine
//! walks happens only through [`IntoContext`].

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::content::Entry;
use crate::core::site::{render_ideas, Idea, SiteConfig};
use crate::core::traits::IntoContext;
use crate::{LeafpressError, Result};

/// A post as exposed to templates under `posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    /// Post title.
    pub title: String,
    /// Public URL, base path included.
    pub url: String,
    /// Post slug.
    pub slug: String,
    /// `YYYY-MM-DD`, or empty when undated.
    pub date: String,
    /// `Mon DD, YYYY`, or empty when undated.
    pub date_human: String,
    /// Post summary.
    pub summary: String,
}

impl PostSummary {
    /// Summarizes `entry` for listings.
    pub fn from_entry(entry: &Entry, site: &SiteConfig) -> Self {
        let (date, date_human) = entry
            .date
            .as_ref()
            .map(|d| (d.iso.clone(), d.human.clone()))
            .unwrap_or_default();
        Self {
            title: entry.title.clone(),
            url: site.public_url(&entry.url_path),
            slug: entry.slug.clone(),
            date,
            date_human,
            summary: entry.summary.clone(),
        }
    }
}

/// Renders the post list as `<li>` links, one per line.
pub fn render_post_list(posts: &[PostSummary]) -> String {
    posts
        .iter()
        .map(|post| {
            let time = if post.date.is_empty() {
                String::new()
            } else {
                format!(
                    " <time datetime=\"{}\">{}</time>",
                    post.date, post.date_human
                )
            };
            format!("<li><a href=\"{}\">{}</a>{}</li>", post.url, post.title, time)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Context values shared by every page of a build.
#[derive(Debug, Clone)]
pub struct SharedContext {
    site: SiteConfig,
    base: Map<String, JsonValue>,
}

impl SharedContext {
    /// Assembles the shared context.
    ///
    /// # Arguments
    ///
    /// * `site` - Site configuration
    /// * `posts` - Posts in listing order
    /// * `ideas` - The idea list
    /// * `build_time` - Instant the build started; supplies `year`
    pub fn new(
        site: &SiteConfig,
        posts: &[&Entry],
        ideas: &[Idea],
        build_time: DateTime<Utc>,
    ) -> Result<Self> {
        let summaries: Vec<PostSummary> = posts
            .iter()
            .map(|entry| PostSummary::from_entry(entry, site))
            .collect();

        let mut base = Map::new();
        _ = base.insert("site".into(), to_json(site)?);
        _ = base.insert("postsHtml".into(), render_post_list(&summaries).into());
        _ = base.insert("posts".into(), to_json(&summaries)?);
        _ = base.insert("ideasHtml".into(), render_ideas(ideas).into());
        _ = base.insert("ideas".into(), to_json(ideas)?);
        _ = base.insert("year".into(), build_time.year().into());

        Ok(Self {
            site: site.clone(),
            base,
        })
    }

    /// The site configuration this context was built from.
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Context for one entry.
    pub fn for_entry<'a>(&'a self, entry: &'a Entry) -> RenderContext<'a> {
        RenderContext {
            shared: self,
            entry,
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue> {
    serde_json::to_value(value).map_err(|e| {
        LeafpressError::internal_error(format!("Failed to serialize context: {}", e))
    })
}

/// The shared context overlaid with one entry's fields.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    shared: &'a SharedContext,
    entry: &'a Entry,
}

impl RenderContext<'_> {
    /// The `page` object: header fields overlaid with derived ones.
    pub fn page(&self) -> Map<String, JsonValue> {
        let entry = self.entry;
        let site = &self.shared.site;
        let (date, date_human) = entry
            .date
            .as_ref()
            .map(|d| (d.iso.clone(), d.human.clone()))
            .unwrap_or_default();

        let mut page = entry.metadata.clone();
        _ = page.insert("title".into(), entry.title.clone().into());
        _ = page.insert("url".into(), site.public_url(&entry.url_path).into());
        _ = page.insert("slug".into(), entry.slug.clone().into());
        _ = page.insert("date".into(), date.into());
        _ = page.insert("dateHuman".into(), date_human.into());
        _ = page.insert("summary".into(), entry.summary.clone().into());
        _ = page.insert("isPost".into(), entry.is_post.into());
        page
    }
}

impl IntoContext for RenderContext<'_> {
    fn into_context(self) -> JsonValue {
        let site = &self.shared.site;
        let page = self.page();

        let text = |key: &str| {
            page.get(key)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        let title = text("title").unwrap_or_else(|| site.title.clone());
        let description = text("description").unwrap_or_else(|| site.description.clone());

        let mut context = self.shared.base.clone();
        _ = context.insert("title".into(), title.into());
        _ = context.insert("description".into(), description.into());
        for key in ["url", "date", "dateHuman"] {
            _ = context.insert(key.into(), page.get(key).cloned().unwrap_or_default());
        }
        _ = context.insert("page".into(), JsonValue::Object(page));
        JsonValue::Object(context)
    }
}
