// Copyright 2026 Oxide Computer Company

//! Short summaries of a revision's changes.

use std::ops::AddAssign;

use serde::Serialize;

use crate::{ChangeRecord, ChangeType};

/// Summary of a revision with no predecessor.
pub const INITIAL_SUMMARY: &str = "initial version";

/// Number of changes of each type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeTally {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    #[serde(rename = "path_version_changed")]
    pub renamed: usize,
}

impl ChangeTally {
    pub fn from_changes<'a>(changes: impl IntoIterator<Item = &'a ChangeRecord>) -> Self {
        let mut tally = Self::default();
        for change in changes {
            tally.count(change.change_type);
        }
        tally
    }

    pub fn count(&mut self, change_type: ChangeType) {
        match change_type {
            ChangeType::Added => self.added += 1,
            ChangeType::Removed => self.removed += 1,
            ChangeType::Modified => self.modified += 1,
            ChangeType::PathVersionChanged => self.renamed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.renamed
    }

    /// Render as e.g. `2 added, 1 modified`, leaving out types with no
    /// changes, or [`INITIAL_SUMMARY`] when there are none at all.
    pub fn summary(&self) -> String {
        let parts = [
            (self.added, "added"),
            (self.removed, "removed"),
            (self.modified, "modified"),
            (self.renamed, "renamed"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, what)| format!("{n} {what}"))
        .collect::<Vec<_>>();

        if parts.is_empty() {
            INITIAL_SUMMARY.to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl AddAssign for ChangeTally {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.removed += other.removed;
        self.modified += other.modified;
        self.renamed += other.renamed;
    }
}

/// Summarize a list of changes.
pub fn summarize(changes: &[ChangeRecord]) -> String {
    ChangeTally::from_changes(changes).summary()
}
