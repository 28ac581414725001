// Copyright 2026 Oxide Computer Company

//! Alignment of the `paths` sections of two documents.
//!
//! A plain key diff of two `paths` maps reports every version bump
//! (`/v1/x` to `/v2/x`) as one deletion plus one unrelated addition. Instead,
//! paths are grouped by their normalized key (see [`crate::normalize`]) and
//! paired within each group:
//!
//! 1. Entries with the same version token on both sides are paired as-is.
//! 2. The remaining entries on each side are sorted by version token and
//!    paired positionally; these pairs have changed version.
//! 3. Whatever is left over was genuinely removed or added.
//!
//! Version tokens sort as strings, so `/v10` sorts before `/v2`.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    normalize::{NormalizedPath, normalize_path_key},
    value::as_map,
};

/// One entry of a `paths` map.
#[derive(Clone, Debug)]
pub(crate) struct PathEntry<'a> {
    pub original_path: &'a str,
    pub version_prefix: Option<String>,
    /// The path item object.
    pub spec: &'a Value,
}

impl PathEntry<'_> {
    fn sort_key(&self) -> &str {
        self.version_prefix.as_deref().unwrap_or("")
    }
}

/// An old and a new path entry that represent the same logical endpoint.
#[derive(Debug)]
pub(crate) struct MatchedPath<'a> {
    pub normalized_key: String,
    pub old: PathEntry<'a>,
    pub new: PathEntry<'a>,
    pub version_changed: bool,
}

#[derive(Debug, Default)]
pub(crate) struct PathMapping<'a> {
    pub matched: Vec<MatchedPath<'a>>,
    pub old_only: Vec<PathEntry<'a>>,
    pub new_only: Vec<PathEntry<'a>>,
}

/// Normalized key, then version token, to path entry.
type PathGroups<'a> = IndexMap<String, IndexMap<Option<String>, PathEntry<'a>>>;

fn group_paths(paths: Option<&Value>) -> PathGroups<'_> {
    let mut groups = PathGroups::new();
    for (path, spec) in as_map(paths) {
        let NormalizedPath {
            normalized_path,
            version_prefix,
            ..
        } = normalize_path_key(path);

        // Two spellings of the same version (`/v1/x` and `/V1/x`) collide
        // here; the later one wins.
        groups.entry(normalized_path).or_default().insert(
            version_prefix.clone(),
            PathEntry {
                original_path: path,
                version_prefix,
                spec,
            },
        );
    }
    groups
}

pub(crate) fn build_path_mapping<'a>(
    old_paths: Option<&'a Value>,
    new_paths: Option<&'a Value>,
) -> PathMapping<'a> {
    let mut old_groups = group_paths(old_paths);
    let mut new_groups = group_paths(new_paths);

    let keys = old_groups
        .keys()
        .chain(new_groups.keys().filter(|k| !old_groups.contains_key(*k)))
        .cloned()
        .collect::<Vec<_>>();

    let mut mapping = PathMapping::default();

    for normalized_key in keys {
        let old_versions = old_groups.shift_remove(&normalized_key).unwrap_or_default();
        let mut new_versions = new_groups.shift_remove(&normalized_key).unwrap_or_default();

        // Same version on both sides.
        let mut unmatched_old = Vec::new();
        for (version, old) in old_versions {
            match new_versions.shift_remove(&version) {
                Some(new) => mapping.matched.push(MatchedPath {
                    normalized_key: normalized_key.clone(),
                    old,
                    new,
                    version_changed: false,
                }),
                None => unmatched_old.push(old),
            }
        }
        let mut unmatched_new = new_versions.into_values().collect::<Vec<_>>();

        // Version replaced by another at the same logical path.
        unmatched_old.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        unmatched_new.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

        let mut old_iter = unmatched_old.into_iter();
        let mut new_iter = unmatched_new.into_iter();
        loop {
            match (old_iter.next(), new_iter.next()) {
                (None, None) => break,
                (Some(old), Some(new)) => mapping.matched.push(MatchedPath {
                    normalized_key: normalized_key.clone(),
                    old,
                    new,
                    version_changed: true,
                }),
                (Some(old), None) => mapping.old_only.push(old),
                (None, Some(new)) => mapping.new_only.push(new),
            }
        }
    }

    mapping
}
