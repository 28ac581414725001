// Copyright 2026 Oxide Computer Company

//! Version-insensitive keys for endpoint paths.
//!
//! The same logical endpoint often moves between URL versions from one
//! revision of a document to the next (`/v1/users` becomes `/v2/users`). To
//! line those up, each path is reduced to a *normalized path* in which the
//! first version segment is replaced by a placeholder, together with the
//! version token that was removed:
//!
//! | path                     | normalized path                 | version |
//! |--------------------------|---------------------------------|---------|
//! | `/v1/users`              | `/{VERSION}/users`              | `/v1`   |
//! | `/api/internal/v2/admin` | `/api/internal/{VERSION}/admin` | `/v2`   |
//! | `/V3`                    | `/{VERSION}`                    | `/v3`   |
//! | `/users`                 | `/users`                        | none    |
//!
//! A version segment is `/v` followed by digits, matched case-insensitively,
//! and must be followed by `/` or the end of the path: `/v1beta/users` and
//! `/video` have no version segment.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Placeholder that stands in for the version segment.
pub const VERSION_PLACEHOLDER: &str = "{VERSION}";

/// A path split into its version-insensitive key and its version token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPath {
    /// The path with its first version segment replaced by
    /// [`VERSION_PLACEHOLDER`], or the original path if it has none.
    pub normalized_path: String,
    /// The lower-cased version segment including its leading slash
    /// (e.g. `/v2`).
    pub version_prefix: Option<String>,
    pub original_path: String,
}

impl NormalizedPath {
    /// The bare version token without its slash (e.g. `v2`).
    pub fn version(&self) -> Option<&str> {
        self.version_prefix
            .as_deref()
            .map(|prefix| prefix.trim_start_matches('/'))
    }
}

/// Split `path` into its normalized key and version token.
pub fn normalize_path_key(path: &str) -> NormalizedPath {
    // The lazy prefix makes the first version-shaped segment win.
    static PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)^(.*?)(/v\d+)(/.*)?$").unwrap());

    match PATTERN.captures(path) {
        Some(captures) => {
            let prefix = captures.get(1).map_or("", |m| m.as_str());
            let version = &captures[2];
            let rest = captures.get(3).map_or("", |m| m.as_str());
            NormalizedPath {
                normalized_path: format!("{prefix}/{VERSION_PLACEHOLDER}{rest}"),
                version_prefix: Some(version.to_lowercase()),
                original_path: path.to_string(),
            }
        }
        None => NormalizedPath {
            normalized_path: path.to_string(),
            version_prefix: None,
            original_path: path.to_string(),
        },
    }
}
