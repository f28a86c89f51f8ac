// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Leafpress CLI
//!
//! Entry point for the `leafpress` binary. It initialises the logger,
//! resolves the build configuration, runs one build and then, when asked,
//! serves the output and/or watches the sources for changes.

use std::thread;

use anyhow::Context;
use clap::ArgMatches;
use log::{error, info, LevelFilter};

use leafpress::{cli, serve, watch, BuildConfig, Leafpress};

/// Initialises `env_logger` with `info` as the default level.
fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );
    if let Some(level) = level {
        _ = builder.filter_level(level);
    }
    builder.init();
}

fn rebuild(config: &BuildConfig) -> leafpress::Result<()> {
    Leafpress::new(config.clone()).build().map(|_| ())
}

fn watch_sources(config: &BuildConfig) -> anyhow::Result<()> {
    let ignore = [config.output_dir.clone()];
    watch::watch_for_changes(&config.source_dir, &ignore, || rebuild(config))
        .context("File watcher stopped")
}

/// Builds once, then serves and/or watches as configured.
fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = cli::resolve_config(matches)
        .context("Failed to resolve build configuration")?;

    let report = Leafpress::new(config.clone())
        .build()
        .context("Build failed")?;
    info!("Site written to {}", report.output_dir.display());

    match (config.serve.enabled, config.serve.watch) {
        (true, watching) => {
            if watching {
                let watch_config = config.clone();
                _ = thread::spawn(move || {
                    if let Err(err) = watch_sources(&watch_config) {
                        error!("{:#}", err);
                    }
                });
            }
            serve::serve_site(&report.output_dir, config.serve.port)
                .context("Development server failed")
        }
        (false, true) => watch_sources(&config),
        (false, false) => Ok(()),
    }
}

/// The main entry point for the Leafpress CLI.
fn main() {
    let matches = cli::build().get_matches();
    init_logger(cli::verbosity(&matches));

    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
