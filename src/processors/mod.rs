// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Content Processors Module
//!
//! Text processors used by the content loader.
//!
//! ## Available Processors
//!
//! - [`frontmatter`]: Splits a source file into YAML metadata and body
//! - [`markdown`]: Converts Markdown bodies to HTML
//!
//! ## Implementing Custom Processors
//!
//! The pipeline accepts any [`Transform`](crate::core::traits::Transform)
//! from `String` to `String` as its Markdown converter:
//!
//! ```rust
//! # use leafpress::core::traits::Transform;
//! # use leafpress::core::error::Result;
//! #[derive(Debug)]
//! struct Preformatted;
//!
//! impl Transform for Preformatted {
//!     type Input = String;
//!     type Output = String;
//!
//!     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
//!         Ok(format!("<pre>{}</pre>", input))
//!     }
//! }
//! ```

/// Front matter parsing.
pub mod frontmatter;

/// Markdown processing functionality.
pub mod markdown;

pub use frontmatter::{parse_front_matter, FrontMatter, Metadata};
pub use markdown::MarkdownProcessor;
