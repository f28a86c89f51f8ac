// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Error Handling for Leafpress
//!
//! This module defines the error type shared by every stage of the build
//! pipeline. The `thiserror` crate is used to derive `Display` and `Error`
//! so that each variant carries a readable message and its source chain.
//!
//! Only fatal conditions are represented here. Recoverable problems (a
//! malformed `_data/site.json`, a missing partial, an unparseable date) are
//! logged and replaced with defaults at the point where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the Leafpress library.
pub type Result<T> = std::result::Result<T, LeafpressError>;

/// The main error type for Leafpress.
#[derive(Error, Debug)]
pub enum LeafpressError {
    /// Error related to build configuration loading or validation.
    #[error("Configuration error: {message}.")]
    ConfigError {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the configuration file that caused the error.
        path: Option<PathBuf>,
    },

    /// Error encountered while turning a source file into an entry.
    #[error("Content processing error: {message}.")]
    ContentProcessingError {
        /// Detailed description of the content processing error.
        message: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error raised while producing an output artifact.
    #[error("Output generation error: {message} at {path:?}.")]
    OutputGenerationError {
        /// Description of the output generation error.
        message: String,
        /// Path of the artifact being generated.
        path: PathBuf,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error related to template or layout rendering.
    #[error(
        "Template rendering error: {message} in template `{template}`."
    )]
    TemplateRenderingError {
        /// Description of the template rendering error.
        message: String,
        /// The template, partial or layout associated with the error.
        template: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error encountered during file operations.
    #[error("File IO error at `{path:?}`: {source}")]
    IOError {
        /// Path associated with the IO error.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output directory resolved to a location that must never be wiped.
    #[error("Refusing to clean output directory `{path:?}`: {reason}.")]
    UnsafeClean {
        /// The resolved output directory.
        path: PathBuf,
        /// Why the directory was rejected.
        reason: String,
    },

    /// General internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for LeafpressError {
    /// Converts a standard IO error into a `LeafpressError::IOError`
    /// with an empty path.
    fn from(source: std::io::Error) -> Self {
        LeafpressError::IOError {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LeafpressError {
    /// Creates a `ConfigError` with a specific message.
    ///
    /// # Parameters
    /// - `message`: A description of the configuration error.
    /// - `path`: Optional path of the configuration file causing the error.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        LeafpressError::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Creates a `ContentProcessingError` with a message and optional source.
    pub fn content_processing_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LeafpressError::ContentProcessingError {
            message: message.into(),
            source,
        }
    }

    /// Creates an `OutputGenerationError` with a message, path, and optional source.
    pub fn output_generation_error<S: Into<String>>(
        message: S,
        path: PathBuf,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LeafpressError::OutputGenerationError {
            message: message.into(),
            path,
            source,
        }
    }

    /// Creates a `TemplateRenderingError` with a message and template name.
    pub fn template_rendering_error<S: Into<String>>(
        message: S,
        template: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LeafpressError::TemplateRenderingError {
            message: message.into(),
            template,
            source,
        }
    }

    /// Wraps an IO error as an `IOError` variant with the specified path.
    ///
    /// # Parameters
    /// - `path`: The file path associated with the IO error.
    /// - `source`: The original IO error.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        LeafpressError::IOError { path, source }
    }

    /// Creates an `UnsafeClean` error for a rejected output directory.
    pub fn unsafe_clean<S: Into<String>>(path: PathBuf, reason: S) -> Self {
        LeafpressError::UnsafeClean {
            path,
            reason: reason.into(),
        }
    }

    /// Creates a general internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        LeafpressError::InternalError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_keeps_path() {
        let err = LeafpressError::io_error(
            PathBuf::from("html/index.html"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("html/index.html"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_from_io_error() {
        let err: LeafpressError =
            io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, LeafpressError::IOError { .. }));
    }

    #[test]
    fn test_unsafe_clean_message() {
        let err = LeafpressError::unsafe_clean(
            PathBuf::from("/"),
            "target is the filesystem root",
        );
        assert_eq!(
            err.to_string(),
            "Refusing to clean output directory `\"/\"`: target is the filesystem root."
        );
    }

    #[test]
    fn test_output_generation_error_names_artifact() {
        let err = LeafpressError::output_generation_error(
            "Failed to serialize post index",
            PathBuf::from("posts.json"),
            None,
        );
        assert_eq!(
            err.to_string(),
            "Output generation error: Failed to serialize post index at \"posts.json\"."
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = LeafpressError::config_error("bad key", None);
        assert_eq!(err.to_string(), "Configuration error: bad key.");
    }
}
