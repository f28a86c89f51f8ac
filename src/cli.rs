// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for Leafpress
//!
//! Argument parsing for the `leafpress` binary. Flags are folded into a
//! [`BuildConfig`] as the last configuration layer, on top of the optional
//! `leafpress.toml` file and `LEAFPRESS_*` environment variables.
//!
//! # Examples
//!
//! ```
//! use leafpress::cli;
//! use std::path::PathBuf;
//!
//! let matches = cli::build().get_matches_from(vec![
//!     "leafpress",
//!     "--in",
//!     "site",
//!     "--out",
//!     "public",
//!     "--serve",
//! ]);
//!
//! let config = cli::resolve_config(&matches).unwrap();
//! assert_eq!(config.source_dir, PathBuf::from("site"));
//! assert!(config.serve.enabled);
//! ```

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, LevelFilter};

use crate::core::config::{ConfigBuilder, DEFAULT_CONFIG_FILE, ENV_PREFIX};
use crate::{BuildConfig, Result};

/// The current version of Leafpress, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds and configures the Leafpress command-line interface.
pub fn build() -> Command {
    Command::new("leafpress")
        .author("Leafpress Contributors")
        .about("Builds a static site from Markdown and HTML sources.")
        .version(VERSION)
        .arg(
            Arg::new("in")
                .short('i')
                .long("in")
                .value_name("DIR")
                .help("Source directory [default: src]")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("DIR")
                .help("Output directory [default: html]")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("clean")
                .long("clean")
                .help("Remove the output directory before building")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("watch")
                .long("watch")
                .help("Rebuild when the source directory changes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .value_name("PORT")
                .help("Serve the output directory after building")
                .num_args(0..=1)
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port for the development server [default: 8080]")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("minify")
                .long("minify")
                .help("Minify written HTML pages")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Build configuration file [default: leafpress.toml if present]")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log output (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
        .after_help(
            "\x1b[1;4mSource layout:\x1b[0m\n\n  _layouts/   layout templates\n  \
             _includes/  partials\n  _data/      site.json and ideas.json\n  \
             posts/      dated posts\n\n\
             \x1b[1;4mLicense:\x1b[0m\n  The project is licensed under the terms of \
             both the MIT license and the Apache License (Version 2.0).",
        )
}

/// Resolves the build configuration for parsed arguments.
///
/// Layers, lowest precedence first: the configuration file (`--config`,
/// else `leafpress.toml` when it exists), `LEAFPRESS_*` environment
/// variables, then the flags themselves.
///
/// # Errors
///
/// Fails when an explicit configuration file is missing or malformed, or
/// when the combined settings do not validate.
pub fn resolve_config(matches: &ArgMatches) -> Result<BuildConfig> {
    let mut builder = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigBuilder::new().with_file(path),
        None => ConfigBuilder::new().with_optional_file(DEFAULT_CONFIG_FILE),
    }
    .with_env_prefix(ENV_PREFIX);

    if let Some(dir) = matches.get_one::<PathBuf>("in") {
        builder = builder.with_override("source_dir", dir.to_string_lossy().into_owned());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("out") {
        builder = builder.with_override("output_dir", dir.to_string_lossy().into_owned());
    }
    if matches.get_flag("clean") {
        builder = builder.with_override("clean", true);
    }
    if matches.get_flag("watch") {
        builder = builder.with_override("serve.watch", true);
    }
    if matches.get_flag("minify") {
        builder = builder.with_override("output.minify", true);
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        builder = builder.with_override("serve.port", i64::from(*port));
    }
    if matches.contains_id("serve") {
        builder = builder.with_override("serve.enabled", true);
        if let Some(port) = matches.get_one::<u16>("serve") {
            builder = builder.with_override("serve.port", i64::from(*port));
        }
    }

    let config = builder.build()?;
    debug!("Resolved build configuration: {:?}", config);
    Ok(config)
}

/// Log level requested with `-v`, if any.
///
/// `None` leaves the level to `RUST_LOG` or the `info` default.
pub fn verbosity(matches: &ArgMatches) -> Option<LevelFilter> {
    match matches.get_count("verbose") {
        0 => None,
        1 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn get_matches(args: Vec<&str>) -> ArgMatches {
        build().get_matches_from(args)
    }

    #[test]
    fn test_flags_override_defaults() {
        let matches = get_matches(vec![
            "leafpress", "-i", "site", "-o", "public", "--clean", "--minify",
        ]);
        let config = resolve_config(&matches).unwrap();

        assert_eq!(config.source_dir, PathBuf::from("site"));
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert!(config.clean);
        assert!(config.output.minify);
        assert!(!config.serve.enabled);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_without_port_keeps_configured_port() {
        let matches = get_matches(vec!["leafpress", "--serve", "--port", "4000"]);
        let config = resolve_config(&matches).unwrap();

        assert!(config.serve.enabled);
        assert_eq!(config.serve.port, 4000);
    }

    #[test]
    fn test_serve_port_wins_over_port_flag() {
        let matches = get_matches(vec!["leafpress", "--port", "4000", "--serve", "5000"]);
        let config = resolve_config(&matches).unwrap();

        assert!(config.serve.enabled);
        assert_eq!(config.serve.port, 5000);
    }

    #[test]
    fn test_directory_flags_are_taken_verbatim() {
        let matches = get_matches(vec!["leafpress", "-i", r"my\site", "-o", r#"out"put"#]);
        let config = resolve_config(&matches).unwrap();

        assert_eq!(config.source_dir, PathBuf::from(r"my\site"));
        assert_eq!(config.output_dir, PathBuf::from(r#"out"put"#));
    }

    #[test]
    fn test_watch_flag() {
        let matches = get_matches(vec!["leafpress", "--watch"]);
        let config = resolve_config(&matches).unwrap();
        assert!(config.serve.watch);
        assert!(!config.serve.enabled);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("site.toml");
        fs::write(
            &file,
            "source_dir = \"content\"\noutput_dir = \"public\"\n\n[output]\nminify = true\n",
        )
        .unwrap();

        let path = file.to_str().unwrap();
        let matches = get_matches(vec!["leafpress", "-c", path, "-o", "dist"]);
        let config = resolve_config(&matches).unwrap();

        assert_eq!(config.source_dir, PathBuf::from("content"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert!(config.output.minify);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let matches =
            get_matches(vec!["leafpress", "--config", missing.to_str().unwrap()]);
        assert!(resolve_config(&matches).is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity(&get_matches(vec!["leafpress"])), None);
        assert_eq!(
            verbosity(&get_matches(vec!["leafpress", "-v"])),
            Some(LevelFilter::Debug)
        );
        assert_eq!(
            verbosity(&get_matches(vec!["leafpress", "-vvv"])),
            Some(LevelFilter::Trace)
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = build().try_get_matches_from(vec!["leafpress", "--port", "http"]);
        assert!(result.is_err());
    }
}
