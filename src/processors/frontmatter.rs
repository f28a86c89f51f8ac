// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Front Matter
//!
//! Splits a source file into its YAML header block and body. The header
//! is delimited by a `---` line at the very top of the file and the next
//! `---` line; everything after the closing fence is the body.
//!
//! ```rust
//! use leafpress::processors::frontmatter::parse_front_matter;
//!
//! let parsed = parse_front_matter("---\ntitle: Hello\n---\nBody text\n");
//! assert_eq!(parsed.data["title"], "Hello");
//! assert_eq!(parsed.content, "Body text\n");
//! ```

use log::warn;
use serde_json::{Map, Value as JsonValue};
use serde_yml::from_str;

/// Key/value metadata parsed from a header block.
pub type Metadata = Map<String, JsonValue>;

const FENCE: &str = "---";

/// A source file split into metadata and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Parsed header fields; empty when there is no header.
    pub data: Metadata,
    /// Text following the header block.
    pub content: String,
}

/// Parses the header block of `raw`.
///
/// A file without a header yields empty data and the whole text as
/// content. A header that is not valid YAML, or is not a mapping, is
/// treated as empty metadata.
pub fn parse_front_matter(raw: &str) -> FrontMatter {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((header, content)) = split_header(raw) else {
        return FrontMatter {
            data: Metadata::new(),
            content: raw.to_string(),
        };
    };

    let data = if header.trim().is_empty() {
        Metadata::new()
    } else {
        match from_str::<JsonValue>(header) {
            Ok(JsonValue::Object(map)) => map,
            Ok(JsonValue::Null) => Metadata::new(),
            Ok(_) => {
                warn!("Front matter is not a mapping; ignoring it");
                Metadata::new()
            }
            Err(e) => {
                warn!("Malformed front matter ignored: {}", e);
                Metadata::new()
            }
        }
    };

    FrontMatter {
        data,
        content: content.to_string(),
    }
}

/// Returns `(header, body)` when `raw` opens with a fence line.
fn split_header(raw: &str) -> Option<(&str, &str)> {
    let first_end = raw.find('\n')?;
    if raw[..first_end].trim_end() != FENCE {
        return None;
    }

    let header_start = first_end + 1;
    let mut offset = header_start;
    for line in raw[header_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let header = &raw[header_start..offset];
            let body = &raw[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Reads a metadata field as a non-empty string.
///
/// Strings are returned as-is, numbers in display form; anything else
/// (booleans, lists, maps, null) counts as absent.
pub fn metadata_str(metadata: &Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a metadata field as a flag (`true`, `"true"`, `"yes"`).
pub fn metadata_flag(metadata: &Metadata, key: &str) -> bool {
    match metadata.get(key) {
        Some(JsonValue::Bool(flag)) => *flag,
        Some(JsonValue::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "yes")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_extraction() {
        let input = r#"---
title: Test Post
description: A test post
date: 2024-01-01
tags:
  - test
  - example
draft: true
---

# Content"#;

        let parsed = parse_front_matter(input);
        assert_eq!(metadata_str(&parsed.data, "title").as_deref(), Some("Test Post"));
        assert_eq!(metadata_str(&parsed.data, "date").as_deref(), Some("2024-01-01"));
        assert!(metadata_flag(&parsed.data, "draft"));
        assert_eq!(parsed.data["tags"][1], "example");
        assert_eq!(parsed.content, "\n# Content");
    }

    #[test]
    fn test_no_header() {
        let parsed = parse_front_matter("# Just a heading\n");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.content, "# Just a heading\n");
    }

    #[test]
    fn test_unterminated_header_is_body() {
        let input = "---\ntitle: x\nno closing fence\n";
        let parsed = parse_front_matter(input);
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.content, input);
    }

    #[test]
    fn test_malformed_header_is_empty_metadata() {
        let parsed = parse_front_matter("---\ntitle: [unclosed\n---\nbody\n");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.content, "body\n");
    }

    #[test]
    fn test_scalar_header_is_empty_metadata() {
        let parsed = parse_front_matter("---\njust a string\n---\nbody");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn test_empty_header() {
        let parsed = parse_front_matter("---\n---\nbody");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn test_crlf_fences() {
        let parsed = parse_front_matter("---\r\ntitle: Windows\r\n---\r\nbody\r\n");
        assert_eq!(parsed.data["title"], "Windows");
        assert_eq!(parsed.content, "body\r\n");
    }

    #[test]
    fn test_metadata_helpers() {
        let parsed = parse_front_matter("---\nslug: ''\nweight: 3\ndraft: 'yes'\nlist: [1]\n---\n");
        assert_eq!(metadata_str(&parsed.data, "slug"), None);
        assert_eq!(metadata_str(&parsed.data, "weight").as_deref(), Some("3"));
        assert_eq!(metadata_str(&parsed.data, "list"), None);
        assert_eq!(metadata_str(&parsed.data, "missing"), None);
        assert!(metadata_flag(&parsed.data, "draft"));
        assert!(!metadata_flag(&parsed.data, "missing"));
    }
}
