// Copyright 2026 Oxide Computer Company

//! Configuration for the `apitrack` binary, read from a TOML file.
//!
//! ```toml
//! [log]
//! mode = "stderr-terminal"
//! level = "info"
//!
//! [notifications]
//! enabled = true
//! base_url = "https://apitrack.example.com"
//! ```
//!
//! Every table is optional.

use anyhow::Context;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use slog::Logger;

use crate::{
    logging::ConfigLogging,
    notify::{LogSender, NoopSender, NotificationSender},
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log: ConfigLogging,
    pub notifications: ConfigNotifications,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigNotifications {
    pub enabled: bool,
    /// Base URL of the web front end, used to link to an endpoint's changes.
    pub base_url: Option<String>,
}

impl Config {
    pub fn from_file(path: &Utf8Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("failed to parse config file {path}"))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str(contents)?)
    }
}

impl ConfigNotifications {
    /// The sender this configuration asks for.
    pub fn sender(&self, log: &Logger) -> Box<dyn NotificationSender> {
        if self.enabled {
            Box::new(LogSender::new(log, self.base_url.clone()))
        } else {
            Box::new(NoopSender)
        }
    }
}
