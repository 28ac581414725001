// Copyright 2026 Oxide Computer Company

//! Notifying the people who own a tracked API that it changed.
//!
//! Delivery is a capability passed to the revision workflow as a
//! [`NotificationSender`]. When notifications are disabled the workflow is
//! given a [`NoopSender`].

use serde::Serialize;
use slog::{Logger, info};

use crate::history::TrackedEndpoint;

/// A new or updated revision worth telling someone about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub endpoint_id: String,
    pub endpoint_name: String,
    pub endpoint_url: String,
    pub version_id: String,
    pub changes_count: usize,
    pub summary: String,
    /// A new version was created, as opposed to an existing one updated.
    pub is_new_version: bool,
}

impl ChangeNotification {
    pub fn new(
        endpoint: &TrackedEndpoint,
        version_id: &str,
        changes_count: usize,
        summary: &str,
        is_new_version: bool,
    ) -> Self {
        Self {
            endpoint_id: endpoint.id.clone(),
            endpoint_name: endpoint.name.clone(),
            endpoint_url: endpoint.url.clone(),
            version_id: version_id.to_string(),
            changes_count,
            summary: summary.to_string(),
            is_new_version,
        }
    }

    pub fn title(&self) -> String {
        let action = if self.is_new_version {
            "new version created"
        } else {
            "changes detected"
        };
        format!("{} - {action}", self.endpoint_name)
    }

    /// Link to the page listing the endpoint's changes.
    pub fn detail_url(&self, base_url: &str) -> String {
        format!(
            "{}/api-detail?id={}",
            base_url.trim_end_matches('/'),
            self.endpoint_id
        )
    }

    /// Render as plain text, with a link to the changes when `base_url` is
    /// known.
    pub fn render(&self, base_url: Option<&str>) -> String {
        let summary = if self.summary.is_empty() {
            "no changes"
        } else {
            &self.summary
        };

        let mut lines = vec![
            self.title(),
            format!("version: {}", self.version_id),
            format!("changes: {}", self.changes_count),
            format!("summary: {summary}"),
        ];
        if let Some(base_url) = base_url {
            lines.push(format!("details: {}", self.detail_url(base_url)));
        }
        lines.push(format!("API URL: {}", self.endpoint_url));
        lines.join("\n")
    }
}

pub trait NotificationSender {
    /// Deliver `notification`. Returns whether anything was delivered.
    fn send(&self, notification: &ChangeNotification) -> anyhow::Result<bool>;
}

/// Sender used when notifications are disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSender;

impl NotificationSender for NoopSender {
    fn send(&self, _notification: &ChangeNotification) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Sender that writes notifications to a log.
#[derive(Clone, Debug)]
pub struct LogSender {
    log: Logger,
    base_url: Option<String>,
}

impl LogSender {
    pub fn new(log: &Logger, base_url: Option<String>) -> Self {
        Self {
            log: log.new(slog::o!("component" => "notify")),
            base_url,
        }
    }
}

impl NotificationSender for LogSender {
    fn send(&self, notification: &ChangeNotification) -> anyhow::Result<bool> {
        let detail_url = self
            .base_url
            .as_deref()
            .map(|base_url| notification.detail_url(base_url));
        info!(
            self.log,
            "{}", notification.title();
            "endpoint" => &notification.endpoint_name,
            "version" => &notification.version_id,
            "changes" => notification.changes_count,
            "summary" => &notification.summary,
            "detail_url" => detail_url,
        );
        Ok(true)
    }
}
