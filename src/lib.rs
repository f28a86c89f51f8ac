// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Leafpress Library
//!
//! Leafpress turns a directory of Markdown and HTML sources with YAML
//! headers into a published tree of HTML pages, plus a sitemap, an RSS
//! feed and a JSON post index.
//!
//! A build is one synchronous pass: load site data, walk the sources,
//! order the posts, render every entry through its layout chain, write
//! the pages, then emit the derived artifacts. Every build is a full
//! rebuild.

#![doc = include_str!("../README.md")]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

pub use crate::core::config::BuildConfig;
pub use crate::core::error::{LeafpressError, Result};

use crate::content::{load_content, sort_posts, Entry};
use crate::context::SharedContext;
use crate::core::site::{load_ideas, SiteConfig};
use crate::core::traits::{Generator, IntoContext, MarkdownConverter};
use crate::generators::html::HtmlGenerator;
use crate::generators::{default_generators, FeedSource};
use crate::layout::{LayoutResolver, DEFAULT_LAYOUT};
use crate::processors::MarkdownProcessor;
use crate::template::TemplateEngine;

/// Command-line interface definition.
pub mod cli;

/// Source walking and entry construction.
pub mod content;

/// Render context assembly.
pub mod context;

/// Configuration, errors, site data and trait seams.
pub mod core;

/// Page writer and derived artifacts.
pub mod generators;

/// Layout chain resolution.
pub mod layout;

/// Filesystem helpers.
pub mod output;

/// Output path and URL derivation.
pub mod paths;

/// Front matter and Markdown processors.
pub mod processors;

/// Development HTTP server.
pub mod serve;

/// Variable and partial substitution.
pub mod template;

/// Source tree watcher.
pub mod watch;

/// Summary of a completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Resolved output directory.
    pub output_dir: PathBuf,
    /// Pages written.
    pub pages: usize,
    /// Posts among the pages.
    pub posts: usize,
    /// Non-content files copied through.
    pub copied: usize,
    /// Derived artifacts written, relative to the output directory.
    pub artifacts: Vec<PathBuf>,
    /// Output paths claimed by more than one entry.
    pub collisions: usize,
}

/// The build pipeline.
///
/// ```rust,no_run
/// use leafpress::{BuildConfig, Leafpress};
///
/// let config = BuildConfig {
///     source_dir: "src".into(),
///     output_dir: "html".into(),
///     ..Default::default()
/// };
/// let report = Leafpress::new(config).build().unwrap();
/// println!("{} pages", report.pages);
/// ```
#[derive(Debug)]
pub struct Leafpress {
    config: BuildConfig,
    markdown: Box<MarkdownConverter>,
    page_writer: HtmlGenerator,
    generators: Vec<Box<dyn Generator>>,
    build_time: Option<DateTime<Utc>>,
}

impl Leafpress {
    /// Creates a pipeline with the default converter and artifacts.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            markdown: Box::new(MarkdownProcessor::from_config(&config.markdown)),
            page_writer: HtmlGenerator::new().with_minification(config.output.minify),
            generators: default_generators(),
            build_time: None,
            config,
        }
    }

    /// Replaces the Markdown converter.
    pub fn with_markdown(mut self, markdown: Box<MarkdownConverter>) -> Self {
        self.markdown = markdown;
        self
    }

    /// Adds a derived artifact generator.
    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    /// Pins the build time instead of reading the clock.
    pub fn with_build_time(mut self, build_time: DateTime<Utc>) -> Self {
        self.build_time = Some(build_time);
        self
    }

    /// The configuration this pipeline builds with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs a full build.
    ///
    /// # Errors
    ///
    /// Fails when the source directory is missing, when cleaning is
    /// requested for an unsafe target, or on any I/O failure. Files
    /// written before a failure stay on disk.
    pub fn build(&self) -> Result<BuildReport> {
        let source_dir = fs::canonicalize(&self.config.source_dir)
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| {
                LeafpressError::config_error(
                    "Source directory does not exist",
                    Some(self.config.source_dir.clone()),
                )
            })?;

        let output_dir = output::resolve_existing(&self.config.output_dir);
        if self.config.clean {
            output::clean_output_dir(&output_dir, &source_dir)?;
        }
        output::ensure_dir(&output_dir)?;
        let output_dir = output::resolve_existing(&output_dir);

        info!(
            "Building {} -> {}",
            source_dir.display(),
            output_dir.display()
        );

        let site = SiteConfig::load(&source_dir);
        let ideas = load_ideas(&source_dir);
        let engine = TemplateEngine::new(&source_dir);
        let layouts = LayoutResolver::new(&source_dir);

        let loaded = load_content(&source_dir, &output_dir, self.markdown.as_ref())?;
        let entries = loaded.entries;
        let collisions = report_collisions(&entries);

        let posts = sort_posts(&entries);
        let build_time = self.build_time.unwrap_or_else(Utc::now);
        let shared = SharedContext::new(&site, &posts, &ideas, build_time)?;

        for entry in &entries {
            let html = render_entry(&engine, &layouts, &shared, entry)?;
            self.page_writer
                .write_page(&output_dir, &entry.output_path, &html)?;
            debug!("Rendered {}", entry.relative_path.display());
        }

        let source = FeedSource {
            site: &site,
            entries: &entries,
            posts: &posts,
            build_time,
        };
        let mut artifacts = Vec::new();
        for generator in &self.generators {
            if let Some(text) = generator.generate(&source)? {
                let relative = PathBuf::from(generator.file_name());
                output::write_file(output_dir.join(&relative), text)?;
                artifacts.push(relative);
            }
        }

        let report = BuildReport {
            output_dir,
            pages: entries.len(),
            posts: posts.len(),
            copied: loaded.copied,
            artifacts,
            collisions,
        };
        info!(
            "Built {} page(s) ({} post(s)), copied {} file(s), wrote {} artifact(s)",
            report.pages,
            report.posts,
            report.copied,
            report.artifacts.len()
        );
        Ok(report)
    }
}

/// Renders one entry's body and wraps it in its layout chain.
fn render_entry(
    engine: &TemplateEngine,
    layouts: &LayoutResolver,
    shared: &SharedContext,
    entry: &Entry,
) -> Result<String> {
    let context = shared.for_entry(entry).into_context();
    let body = engine.render(&entry.html_content, &context).map_err(|e| {
        LeafpressError::template_rendering_error(
            "Failed to render page body",
            entry.relative_path.display().to_string(),
            Some(Box::new(e)),
        )
    })?;
    let layout = entry.layout_name(DEFAULT_LAYOUT);
    layouts.apply_layouts(engine, layout.as_deref(), body, &context)
}

/// Warns about entries sharing an output path; the later one wins.
fn report_collisions(entries: &[Entry]) -> usize {
    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    let mut collisions = 0;
    for entry in entries {
        if let Some(previous) =
            claimed.insert(&entry.output_path, &entry.relative_path)
        {
            collisions += 1;
            warn!(
                "{} and {} both map to {}; {} wins",
                previous.display(),
                entry.relative_path.display(),
                entry.output_path.display(),
                entry.relative_path.display()
            );
        }
    }
    collisions
}

/// Builds `source_dir` into `output_dir` with default settings.
///
/// When `clean` is set the output directory is removed first, unless it
/// resolves to the filesystem root, the working directory or the source
/// directory.
pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output_dir: Q,
    clean: bool,
) -> Result<BuildReport> {
    let config = BuildConfig {
        source_dir: source_dir.as_ref().to_path_buf(),
        output_dir: output_dir.as_ref().to_path_buf(),
        clean,
        ..BuildConfig::default()
    };
    Leafpress::new(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn pinned(source: &Path, output: &Path) -> Leafpress {
        let config = BuildConfig {
            source_dir: source.to_path_buf(),
            output_dir: output.to_path_buf(),
            ..BuildConfig::default()
        };
        Leafpress::new(config)
            .with_build_time(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_missing_source_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = build(dir.path().join("nope"), dir.path().join("out"), false)
            .unwrap_err();
        assert!(matches!(err, LeafpressError::ConfigError { .. }));
    }

    #[test]
    fn test_build_renders_layout_and_body_variables() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src, "_layouts/base.html", "<title>{{ title }}</title>{{ content }}");
        write(&src, "index.md", "---\ntitle: Home\n---\nWelcome to {{ site.title }} in {{ year }}.\n");

        let out = dir.path().join("html");
        let report = pinned(&src, &out).build().unwrap();
        assert_eq!(report.pages, 1);

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert_eq!(
            html,
            "<title>Home</title><p>Welcome to Leafpress in 2026.</p>\n"
        );
    }

    #[test]
    fn test_collisions_are_counted_and_last_wins() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src, "a.md", "---\npermalink: /same/\nlayout: none\n---\nfirst");
        write(&src, "b.md", "---\npermalink: /same/\nlayout: none\n---\nsecond");

        let out = dir.path().join("html");
        let report = pinned(&src, &out).build().unwrap();
        assert_eq!(report.collisions, 1);
        let html = fs::read_to_string(out.join("same/index.html")).unwrap();
        assert_eq!(html, "<p>second</p>\n");
    }

    #[test]
    fn test_custom_generator_runs() {
        #[derive(Debug)]
        struct Robots;

        impl Generator for Robots {
            fn file_name(&self) -> &str {
                "robots.txt"
            }

            fn generate(&self, _source: &FeedSource<'_>) -> Result<Option<String>> {
                Ok(Some("User-agent: *\n".into()))
            }
        }

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src, "index.html", "<p>home</p>");

        let out = dir.path().join("html");
        let report = pinned(&src, &out)
            .with_generator(Box::new(Robots))
            .build()
            .unwrap();
        assert!(report.artifacts.contains(&PathBuf::from("robots.txt")));
        assert!(!report.artifacts.contains(&PathBuf::from("CNAME")));
        assert_eq!(
            fs::read_to_string(out.join("robots.txt")).unwrap(),
            "User-agent: *\n"
        );
    }
}
