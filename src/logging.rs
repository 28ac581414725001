// Copyright 2026 Oxide Computer Company

//! Logger construction from configuration.
//!
//! The comparison engine itself never logs; loggers are created here once and
//! handed to the revision workflows and notification senders.

use std::{
    fs::OpenOptions,
    io::{self, LineWriter, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use slog::{Drain, Level, Logger};

/// Where log records go. Expected as the `[log]` table of the configuration
/// file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum ConfigLogging {
    /// Human-readable output to stderr.
    StderrTerminal { level: ConfigLoggingLevel },
    /// Bunyan-formatted output to a file.
    File {
        level: ConfigLoggingLevel,
        path: Utf8PathBuf,
        #[serde(default)]
        if_exists: ConfigLoggingIfExists,
    },
}

impl Default for ConfigLogging {
    fn default() -> Self {
        ConfigLogging::StderrTerminal {
            level: ConfigLoggingLevel::Warn,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLoggingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl From<ConfigLoggingLevel> for Level {
    fn from(level: ConfigLoggingLevel) -> Level {
        match level {
            ConfigLoggingLevel::Trace => Level::Trace,
            ConfigLoggingLevel::Debug => Level::Debug,
            ConfigLoggingLevel::Info => Level::Info,
            ConfigLoggingLevel::Warn => Level::Warning,
            ConfigLoggingLevel::Error => Level::Error,
            ConfigLoggingLevel::Critical => Level::Critical,
        }
    }
}

/// What to do when the log file already exists.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLoggingIfExists {
    Fail,
    Truncate,
    #[default]
    Append,
}

impl ConfigLogging {
    /// Create a root logger for this configuration.
    pub fn to_logger(&self, log_name: &str) -> io::Result<Logger> {
        match self {
            ConfigLogging::StderrTerminal { level } => {
                let decorator = slog_term::TermDecorator::new().stderr().build();
                let drain = slog_term::FullFormat::new(decorator).build().fuse();
                Ok(async_root_logger(*level, drain))
            }

            ConfigLogging::File {
                level,
                path,
                if_exists,
            } => {
                let mut open_options = OpenOptions::new();
                open_options.write(true).create(true);
                match if_exists {
                    ConfigLoggingIfExists::Fail => {
                        open_options.create_new(true);
                    }
                    ConfigLoggingIfExists::Append => {
                        open_options.append(true);
                    }
                    ConfigLoggingIfExists::Truncate => {
                        open_options.truncate(true);
                    }
                }

                let drain = file_drain(&open_options, path, log_name)?;
                let logger = async_root_logger(*level, drain);

                // Leave a pointer to the log for whoever is watching stderr.
                if let Err(err) = writeln!(io::stderr(), "note: logging to \"{path}\"") {
                    slog::warn!(logger, "failed to report log path on stderr"; "err" => %err);
                }

                Ok(logger)
            }
        }
    }
}

fn async_root_logger<D>(level: ConfigLoggingLevel, drain: D) -> Logger
where
    D: Drain + Send + 'static,
    D::Err: std::fmt::Debug,
{
    let level_drain = slog::LevelFilter(drain, Level::from(level)).fuse();
    let async_drain = slog_async::Async::new(level_drain)
        .chan_size(1024)
        .build()
        .fuse();
    Logger::root(async_drain, slog::o!())
}

fn file_drain(
    open_options: &OpenOptions,
    path: &Utf8Path,
    log_name: &str,
) -> io::Result<impl Drain<Ok = (), Err = slog::Never> + Send + 'static> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = LineWriter::new(open_options.open(path)?);

    // The bunyan name must be 'static; one logger is built per process.
    let log_name: &'static str = Box::leak(log_name.to_string().into_boxed_str());
    Ok(slog_bunyan::with_name(log_name, file).build().fuse())
}
