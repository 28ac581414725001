// Copyright 2026 Oxide Computer Company

//! apitrack
//!
//! Track revisions of OpenAPI (3.x) and Swagger (2.0) documents and classify
//! the changes between consecutive revisions.
//!
//! The core is [`analyze_changes`], a pure function from two parsed documents
//! to an ordered list of [`ChangeRecord`]s. Documents are
//! [`serde_json::Value`] trees; `$ref`s are compared as plain values and never
//! followed, and an owned tree cannot contain cycles, so every comparison
//! terminates.
//!
//! Endpoints that move between URL versions (`/v1/users` to `/v2/users`) are
//! reported as renames rather than as a removal plus an addition; see
//! [`normalize_path_key`].
//!
//! Around the engine sit the revision workflows in [`history`], change
//! summaries in [`summary`], notifications in [`notify`], and the
//! configuration and logging used by the `apitrack` binary.

mod align;
mod change;
mod collection;
mod compare;
pub mod config;
pub mod document;
pub mod history;
pub mod logging;
mod normalize;
pub mod notify;
mod operation;
mod raw;
mod setops;
pub mod summary;
mod value;

pub use change::*;
pub use collection::{compare_array, compare_object_map};
pub use compare::analyze_changes;
pub use normalize::{NormalizedPath, VERSION_PLACEHOLDER, normalize_path_key};
pub use operation::compare_operation;
pub use raw::{raw_diff, unified_text_diff};
pub use value::{Target, compare_value};
