// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom-domain marker (`CNAME`), written only when `domain` is set.

use crate::core::traits::Generator;
use crate::generators::FeedSource;
use crate::Result;

/// Output file name.
pub const DOMAIN_FILE: &str = "CNAME";

/// Produces the `CNAME` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainGenerator;

impl Generator for DomainGenerator {
    fn file_name(&self) -> &str {
        DOMAIN_FILE
    }

    fn generate(&self, source: &FeedSource<'_>) -> Result<Option<String>> {
        let domain = source.site.domain.trim();
        Ok((!domain.is_empty()).then(|| format!("{}\n", domain)))
    }
}
