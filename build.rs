// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build script that refuses toolchains older than the declared MSRV.

/// Minimum supported Rust version, kept in sync with `rust-version`.
const MIN_RUSTC_VERSION: &str = "1.80.0";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    match version_check::is_min_version(MIN_RUSTC_VERSION) {
        Some(true) => {}
        Some(false) => {
            eprintln!(
                "leafpress requires rustc {} or newer",
                MIN_RUSTC_VERSION
            );
            std::process::exit(1);
        }
        None => {
            println!(
                "cargo:warning=unable to determine rustc version, assuming >= {}",
                MIN_RUSTC_VERSION
            );
        }
    }
}
