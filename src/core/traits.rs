// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Core Traits Module
//!
//! The seams of the build pipeline. Each trait has one job:
//!
//! - [`Transform`]: a pure text-to-text conversion, used for the Markdown
//!   converter so the pipeline never depends on a concrete Markdown crate.
//! - [`Generator`]: produces one derived artifact (sitemap, RSS, JSON
//!   index, domain marker) from the assembled site.
//! - [`IntoContext`]: turns a typed value into the dynamic JSON object the
//!   template engine walks. Dynamic lookup stops at this boundary.

use serde_json::Value as JsonValue;

use crate::core::error::Result;
use crate::generators::FeedSource;

/// Trait for implementing content transformation operations.
///
/// # Type Parameters
///
/// * `Input`: The input type for the transformation
/// * `Output`: The output type produced by the transformation
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// The type of input content for the transformation
    type Input;
    /// The type of output content produced by the transformation
    type Output;

    /// Transforms the input content into the output format.
    ///
    /// # Arguments
    ///
    /// * `input` - The content to transform
    ///
    /// # Returns
    ///
    /// A `Result` containing either the transformed content or an error.
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}

/// The Markdown-to-HTML converter consumed by the content loader.
pub type MarkdownConverter = dyn Transform<Input = String, Output = String>;

/// Trait for implementing derived-artifact generation.
///
/// Generators only read the assembled site; they never see the source
/// tree, so the same entry and post collections drive every artifact.
pub trait Generator: Send + Sync + std::fmt::Debug {
    /// File name of the artifact, relative to the output root.
    fn file_name(&self) -> &str;

    /// Produces the artifact text.
    ///
    /// Returns `Ok(None)` when the artifact does not apply to this site
    /// (for example the domain marker when no domain is configured).
    fn generate(&self, source: &FeedSource<'_>) -> Result<Option<String>>;
}

/// Trait for types that can be converted into a template context.
pub trait IntoContext {
    /// Converts the type into a template context.
    ///
    /// # Returns
    ///
    /// A `JsonValue` representing the context. Implementations return an
    /// object so that dotted lookups have something to walk.
    fn into_context(self) -> JsonValue;
}

impl IntoContext for JsonValue {
    fn into_context(self) -> JsonValue {
        self
    }
}
