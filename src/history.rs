// Copyright 2026 Oxide Computer Company

//! Revision workflows around the comparison engine.
//!
//! A tracked endpoint is fetched periodically. Each fetched document is filed
//! under its major version (see [`extract_major_version`]): if that version
//! already exists the new document is compared against it and, when it
//! changed, replaces it as a new revision; otherwise a new version is created
//! and compared against the endpoint's latest one. Storage is behind
//! [`RevisionStore`] and delivery of notifications behind
//! [`NotificationSender`].

use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::{Logger, debug, info, o, warn};
use thiserror::Error;

use crate::{
    Analysis, ChangeRecord, analyze_changes,
    document::{count_endpoints, extract_major_version, validate_document},
    notify::{ChangeNotification, NotificationSender},
    summary::ChangeTally,
};

/// An API whose document is being tracked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEndpoint {
    pub id: String,
    pub name: String,
    pub url: String,
    /// The team or group that owns the API.
    #[serde(default)]
    pub group: Option<String>,
    /// Documents are only recorded for active endpoints.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Number of versions created so far.
    #[serde(default)]
    pub version_count: u32,
    #[serde(default)]
    pub last_fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_fetch_status: Option<FetchStatus>,
    /// Why the last fetch failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

fn default_active() -> bool {
    true
}

impl TrackedEndpoint {
    /// An active endpoint that has not been fetched yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            group: None,
            is_active: true,
            version_count: 0,
            last_fetched_at: None,
            last_fetch_status: None,
            error_message: None,
        }
    }

    fn record_fetch(&mut self, now: DateTime<Utc>, error: Option<String>) {
        self.last_fetched_at = Some(now);
        self.last_fetch_status = Some(match error {
            Some(_) => FetchStatus::Error,
            None => FetchStatus::Success,
        });
        self.error_message = error;
    }
}

/// How the last attempt to record a document for an endpoint went.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionError {
    #[error("no tracked endpoint with id {0:?}")]
    UnknownEndpoint(String),
    #[error("endpoint {0} is inactive")]
    InactiveEndpoint(String),
}

/// A change as it is stored: the record plus when it was detected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedChange {
    #[serde(flatten)]
    pub change: ChangeRecord,
    pub recorded_at: DateTime<Utc>,
}

/// One entry of a version's update history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionNote {
    pub updated_at: DateTime<Utc>,
    pub changes_count: usize,
    pub summary: String,
}

/// The stored state of one major version of a tracked endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVersion {
    pub endpoint_id: String,
    /// The major version this entry is filed under, e.g. `v2`.
    pub version_id: String,
    /// Position among the endpoint's versions, starting at 1.
    pub version_number: u32,
    /// The version that was the endpoint's latest when this one was created.
    #[serde(default)]
    pub previous_version_id: Option<String>,
    /// Number of documents recorded under this version.
    pub revision_count: u32,
    /// The latest document.
    pub document: Value,
    /// Every change recorded under this version, oldest first.
    pub changes: Vec<RecordedChange>,
    pub change_history: Vec<RevisionNote>,
    pub endpoint_count: usize,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Persistence of tracked endpoints and their stored versions.
pub trait RevisionStore {
    fn find_endpoint(&self, endpoint_id: &str) -> anyhow::Result<Option<TrackedEndpoint>>;

    /// Insert or replace the endpoint with the same ID.
    fn save_endpoint(&mut self, endpoint: TrackedEndpoint) -> anyhow::Result<()>;

    /// The version of `endpoint_id` filed under `version_id`, if any.
    fn find_version(
        &self,
        endpoint_id: &str,
        version_id: &str,
    ) -> anyhow::Result<Option<StoredVersion>>;

    /// The version of `endpoint_id` with the highest version number.
    fn latest_version(&self, endpoint_id: &str) -> anyhow::Result<Option<StoredVersion>>;

    /// Every stored version of every endpoint.
    fn all_versions(&self) -> anyhow::Result<Vec<StoredVersion>>;

    /// Insert or replace the version identified by its endpoint and version
    /// ID.
    fn save_version(&mut self, version: StoredVersion) -> anyhow::Result<()>;
}

/// A [`RevisionStore`] held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    endpoints: BTreeMap<String, TrackedEndpoint>,
    versions: BTreeMap<(String, String), StoredVersion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions(&self) -> impl Iterator<Item = &StoredVersion> {
        self.versions.values()
    }
}

impl RevisionStore for MemoryStore {
    fn find_endpoint(&self, endpoint_id: &str) -> anyhow::Result<Option<TrackedEndpoint>> {
        Ok(self.endpoints.get(endpoint_id).cloned())
    }

    fn save_endpoint(&mut self, endpoint: TrackedEndpoint) -> anyhow::Result<()> {
        self.endpoints.insert(endpoint.id.clone(), endpoint);
        Ok(())
    }

    fn find_version(
        &self,
        endpoint_id: &str,
        version_id: &str,
    ) -> anyhow::Result<Option<StoredVersion>> {
        Ok(self
            .versions
            .get(&(endpoint_id.to_string(), version_id.to_string()))
            .cloned())
    }

    fn latest_version(&self, endpoint_id: &str) -> anyhow::Result<Option<StoredVersion>> {
        Ok(self
            .versions
            .values()
            .filter(|v| v.endpoint_id == endpoint_id)
            .max_by_key(|v| v.version_number)
            .cloned())
    }

    fn all_versions(&self) -> anyhow::Result<Vec<StoredVersion>> {
        Ok(self.versions.values().cloned().collect())
    }

    fn save_version(&mut self, version: StoredVersion) -> anyhow::Result<()> {
        let key = (version.endpoint_id.clone(), version.version_id.clone());
        self.versions.insert(key, version);
        Ok(())
    }
}

/// What [`record_revision`] did with a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevisionOutcome {
    /// The document matches the stored one; nothing was written.
    Unchanged { version_id: String },
    /// The document replaced the stored one for its version.
    Updated {
        version_id: String,
        revision_count: u32,
        changes_count: usize,
        summary: String,
    },
    /// The document started a new version.
    Created {
        version_id: String,
        version_number: u32,
        changes_count: usize,
        summary: String,
    },
}

fn timestamped(changes: Vec<ChangeRecord>, now: DateTime<Utc>) -> Vec<RecordedChange> {
    changes
        .into_iter()
        .map(|change| RecordedChange {
            change,
            recorded_at: now,
        })
        .collect()
}

/// Record a newly fetched `document` for the endpoint `endpoint_id`.
///
/// Every change found is stamped with `now`. A notification is sent when a
/// stored version is updated, or when a new version differs from its
/// predecessor; failing to deliver it does not fail the revision. Whether
/// recording succeeded is saved on the endpoint as its last fetch status.
/// Inactive endpoints are refused without touching the store.
pub fn record_revision(
    store: &mut dyn RevisionStore,
    notifier: &dyn NotificationSender,
    log: &Logger,
    endpoint_id: &str,
    document: Value,
    now: DateTime<Utc>,
) -> anyhow::Result<RevisionOutcome> {
    let mut endpoint = store
        .find_endpoint(endpoint_id)
        .with_context(|| format!("looking up endpoint {endpoint_id}"))?
        .ok_or_else(|| RevisionError::UnknownEndpoint(endpoint_id.to_string()))?;
    if !endpoint.is_active {
        return Err(RevisionError::InactiveEndpoint(endpoint.name).into());
    }
    let log = log.new(o!("endpoint" => endpoint.name.clone()));

    let (outcome, notification) = match store_document(store, &log, &endpoint, document, now) {
        Ok(stored) => {
            endpoint.record_fetch(now, None);
            if let RevisionOutcome::Created { .. } = stored.0 {
                endpoint.version_count += 1;
            }
            store
                .save_endpoint(endpoint.clone())
                .with_context(|| format!("saving endpoint {}", endpoint.name))?;
            stored
        }
        Err(error) => {
            endpoint.record_fetch(now, Some(format!("{error:#}")));
            if let Err(save_error) = store.save_endpoint(endpoint) {
                warn!(log, "failed to save fetch status"; "error" => %format!("{save_error:#}"));
            }
            return Err(error);
        }
    };

    if let Some(notification) = notification {
        if let Err(error) = notifier.send(&notification) {
            warn!(log, "failed to send notification"; "error" => %format!("{error:#}"));
        }
    }

    Ok(outcome)
}

fn store_document(
    store: &mut dyn RevisionStore,
    log: &Logger,
    endpoint: &TrackedEndpoint,
    document: Value,
    now: DateTime<Utc>,
) -> anyhow::Result<(RevisionOutcome, Option<ChangeNotification>)> {
    let kind = validate_document(&document)
        .with_context(|| format!("invalid document for {}", endpoint.url))?;
    let version_id = extract_major_version(&document);

    let existing = store
        .find_version(&endpoint.id, &version_id)
        .with_context(|| format!("looking up version {version_id} of {}", endpoint.name))?;

    match existing {
        Some(mut version) => {
            let Analysis {
                has_changes,
                changes,
            } = analyze_changes(&version.document, &document);
            if !has_changes {
                info!(log, "document unchanged"; "version" => &version_id);
                return Ok((RevisionOutcome::Unchanged { version_id }, None));
            }

            let changes = timestamped(changes, now);
            let summary = ChangeTally::from_changes(changes.iter().map(|c| &c.change)).summary();
            let changes_count = changes.len();

            version.endpoint_count = count_endpoints(&document);
            version.document = document;
            version.last_updated_at = now;
            version.summary = summary.clone();
            version.changes.extend(changes);
            version.change_history.push(RevisionNote {
                updated_at: now,
                changes_count,
                summary: summary.clone(),
            });
            version.revision_count += 1;
            let revision_count = version.revision_count;
            store
                .save_version(version)
                .with_context(|| format!("saving version {version_id} of {}", endpoint.name))?;

            info!(
                log,
                "version updated";
                "version" => &version_id,
                "revision" => revision_count,
                "changes" => changes_count,
            );

            let notification =
                ChangeNotification::new(endpoint, &version_id, changes_count, &summary, false);
            let outcome = RevisionOutcome::Updated {
                version_id,
                revision_count,
                changes_count,
                summary,
            };
            Ok((outcome, Some(notification)))
        }
        None => {
            let latest = store
                .latest_version(&endpoint.id)
                .with_context(|| format!("looking up latest version of {}", endpoint.name))?;
            let version_number = latest.as_ref().map_or(1, |v| v.version_number + 1);
            let changes = latest
                .as_ref()
                .map(|latest| {
                    timestamped(analyze_changes(&latest.document, &document).changes, now)
                })
                .unwrap_or_default();
            let summary = ChangeTally::from_changes(changes.iter().map(|c| &c.change)).summary();
            let changes_count = changes.len();
            let change_history = if changes.is_empty() {
                Vec::new()
            } else {
                vec![RevisionNote {
                    updated_at: now,
                    changes_count,
                    summary: summary.clone(),
                }]
            };

            store
                .save_version(StoredVersion {
                    endpoint_id: endpoint.id.clone(),
                    version_id: version_id.clone(),
                    version_number,
                    previous_version_id: latest.map(|v| v.version_id),
                    revision_count: 1,
                    endpoint_count: count_endpoints(&document),
                    document,
                    changes,
                    change_history,
                    summary: summary.clone(),
                    created_at: now,
                    last_updated_at: now,
                })
                .with_context(|| format!("saving version {version_id} of {}", endpoint.name))?;

            info!(
                log,
                "version created";
                "version" => &version_id,
                "number" => version_number,
                "kind" => %kind,
                "changes" => changes_count,
            );

            let notification = (changes_count > 0).then(|| {
                ChangeNotification::new(endpoint, &version_id, changes_count, &summary, true)
            });
            let outcome = RevisionOutcome::Created {
                version_id,
                version_number,
                changes_count,
                summary,
            };
            Ok((outcome, notification))
        }
    }
}

/// Compare two stored documents on demand. Nothing is recorded.
pub fn rediff(old: &StoredVersion, new: &StoredVersion) -> Analysis {
    analyze_changes(&old.document, &new.document)
}

/// A document in an ordered history, as fed to [`recompute`].
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub id: &'a str,
    pub document: &'a Value,
}

/// The recomputed changes of one snapshot or stored version against its
/// predecessor.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputedChanges {
    pub id: String,
    pub previous_id: String,
    pub changes: Vec<ChangeRecord>,
    pub tally: ChangeTally,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Recomputation {
    pub updated: Vec<RecomputedChanges>,
    /// Entries with no predecessor to compare against.
    pub skipped: Vec<String>,
    pub totals: ChangeTally,
}

/// Recompute the changes of every snapshot in an ordered history against the
/// snapshot before it.
///
/// The first snapshot has no predecessor and is skipped. Running this twice
/// over the same history gives the same result.
pub fn recompute<'a>(snapshots: impl IntoIterator<Item = Snapshot<'a>>) -> Recomputation {
    let mut result = Recomputation::default();
    let mut previous: Option<Snapshot<'a>> = None;

    for snapshot in snapshots {
        match previous {
            None => result.skipped.push(snapshot.id.to_string()),
            Some(prev) => {
                let changes = analyze_changes(prev.document, snapshot.document).changes;
                let tally = ChangeTally::from_changes(&changes);
                result.totals += tally;
                result.updated.push(RecomputedChanges {
                    id: snapshot.id.to_string(),
                    previous_id: prev.id.to_string(),
                    changes,
                    tally,
                });
            }
        }
        previous = Some(snapshot);
    }

    result
}

/// Recompute the changes of every stored version that has a predecessor and
/// overwrite its stored changes with the result.
///
/// The new changes are stamped with the time the version's document was last
/// recorded. Versions without a predecessor, or whose predecessor is no
/// longer stored, are skipped. A second run leaves the store as the first one
/// left it.
pub fn recompute_stored(
    store: &mut dyn RevisionStore,
    log: &Logger,
) -> anyhow::Result<Recomputation> {
    let mut versions = store.all_versions().context("listing stored versions")?;
    versions.sort_by(|a, b| {
        (&a.endpoint_id, a.version_number).cmp(&(&b.endpoint_id, b.version_number))
    });

    let mut result = Recomputation::default();
    for mut version in versions {
        let id = format!("{}/{}", version.endpoint_id, version.version_id);
        let Some(previous_version_id) = version.previous_version_id.clone() else {
            debug!(log, "first version, skipped"; "version" => &id);
            result.skipped.push(id);
            continue;
        };
        let previous = store
            .find_version(&version.endpoint_id, &previous_version_id)
            .with_context(|| format!("looking up the predecessor of {id}"))?;
        let Some(previous) = previous else {
            warn!(
                log,
                "predecessor missing, skipped";
                "version" => &id,
                "previous" => &previous_version_id,
            );
            result.skipped.push(id);
            continue;
        };

        let changes = analyze_changes(&previous.document, &version.document).changes;
        let tally = ChangeTally::from_changes(&changes);
        info!(
            log,
            "recomputed changes";
            "version" => &id,
            "before" => version.changes.len(),
            "after" => changes.len(),
        );

        let previous_id = format!("{}/{previous_version_id}", version.endpoint_id);
        version.changes = timestamped(changes.clone(), version.last_updated_at);
        store
            .save_version(version)
            .with_context(|| format!("saving version {id}"))?;

        result.totals += tally;
        result.updated.push(RecomputedChanges {
            id,
            previous_id,
            changes,
            tally,
        });
    }

    Ok(result)
}

impl RevisionOutcome {
    pub fn version_id(&self) -> &str {
        match self {
            RevisionOutcome::Unchanged { version_id }
            | RevisionOutcome::Updated { version_id, .. }
            | RevisionOutcome::Created { version_id, .. } => version_id,
        }
    }

    /// The summary stored with the revision;
    /// [`INITIAL_SUMMARY`](crate::summary::INITIAL_SUMMARY) for the first
    /// version of an endpoint.
    pub fn summary(&self) -> Option<&str> {
        match self {
            RevisionOutcome::Unchanged { .. } => None,
            RevisionOutcome::Updated { summary, .. } | RevisionOutcome::Created { summary, .. } => {
                Some(summary)
            }
        }
    }

    /// The document started the endpoint's first version.
    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            RevisionOutcome::Created {
                version_number: 1,
                ..
            }
        )
    }
}
