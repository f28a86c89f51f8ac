// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// The `config` module provides build configuration handling
pub mod config;

/// The `error` module provides error handling
pub mod error;

/// The `site` module provides site configuration and data lists
pub mod site;

/// The `traits` module provides the pipeline seams
pub mod traits;
