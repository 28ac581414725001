// Copyright 2026 Oxide Computer Company

//! Command-line front end: compare documents, inspect path normalization and
//! recompute the changes of a stored history.

use std::process::ExitCode;

use anyhow::{Context, bail};
use apitrack::{
    Analysis, ChangeRecord, analyze_changes,
    config::Config,
    document::validate_document,
    history::{Snapshot, recompute},
    normalize_path_key, raw_diff,
    summary::ChangeTally,
    unified_text_diff,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use serde_json::Value;
use slog::{Logger, debug, info, warn};

/// Track and classify changes between OpenAPI document revisions.
#[derive(Parser)]
#[command(name = "apitrack", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the changes between two documents. Exits with 1 if there are
    /// any.
    Diff {
        /// The earlier document
        old: Utf8PathBuf,
        /// The later document
        new: Utf8PathBuf,
        /// Print the changes as JSON
        #[arg(long, conflicts_with_all = ["raw", "unified"])]
        json: bool,
        /// Print an RFC 6902 JSON patch instead of classified changes
        #[arg(long, conflicts_with = "unified")]
        raw: bool,
        /// Print a unified line diff instead of classified changes
        #[arg(long)]
        unified: bool,
    },

    /// Show the version-insensitive key of endpoint paths
    Normalize {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute the changes between consecutive documents in a directory,
    /// ordered by file name
    Recompute {
        dir: Utf8PathBuf,
        /// Print the recomputed changes as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let log = config
        .log
        .to_logger("apitrack")
        .context("failed to create logger")?;

    match cli.command {
        Commands::Diff {
            old,
            new,
            json,
            raw,
            unified,
        } => {
            let old = read_document(&log, &old)?;
            let new = read_document(&log, &new)?;
            let analysis = analyze_changes(&old, &new);
            info!(log, "compared documents"; "changes" => analysis.changes.len());

            if raw {
                println!("{}", serde_json::to_string_pretty(&raw_diff(&old, &new))?);
            } else if unified {
                print!("{}", unified_text_diff(&old, &new));
            } else if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_analysis(&analysis);
            }

            Ok(if analysis.has_changes {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::Normalize { paths, json } => {
            let keys = paths
                .iter()
                .map(|path| normalize_path_key(path))
                .collect::<Vec<_>>();
            if json {
                println!("{}", serde_json::to_string_pretty(&keys)?);
            } else {
                for key in &keys {
                    println!(
                        "{}\t{}\t{}",
                        key.original_path,
                        key.normalized_path,
                        key.version_prefix.as_deref().unwrap_or("-"),
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Recompute { dir, json } => {
            let documents = read_history(&log, &dir)?;
            let result = recompute(documents.iter().map(|(id, document)| Snapshot {
                id: id.as_str(),
                document,
            }));
            info!(
                log,
                "recomputed changes";
                "updated" => result.updated.len(),
                "skipped" => result.skipped.len(),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for id in &result.skipped {
                    println!("{id}: first version, skipped");
                }
                for entry in &result.updated {
                    println!(
                        "{}: {} changes since {} ({})",
                        entry.id,
                        entry.changes.len(),
                        entry.previous_id,
                        tally_line(&entry.tally),
                    );
                }
                println!("total: {}", tally_line(&result.totals));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_document(log: &Logger, path: &Utf8Path) -> anyhow::Result<Value> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let document: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {path} as JSON"))?;

    // Comparison works on any JSON value; only note documents that do not
    // look like API descriptions.
    match validate_document(&document) {
        Ok(kind) => {
            debug!(log, "read document"; "path" => %path, "kind" => %kind);
        }
        Err(error) => {
            warn!(log, "unexpected document"; "path" => %path, "error" => %error);
        }
    }
    Ok(document)
}

/// Read every `*.json` file in `dir`, ordered by file name.
fn read_history(log: &Logger, dir: &Utf8Path) -> anyhow::Result<Vec<(String, Value)>> {
    let mut paths = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("failed to read directory {dir}"))?
    {
        let entry = entry.with_context(|| format!("failed to read directory {dir}"))?;
        if entry.path().extension() == Some("json") {
            paths.push(entry.path().to_owned());
        }
    }
    if paths.is_empty() {
        bail!("no JSON documents in {dir}");
    }
    paths.sort();

    paths
        .iter()
        .map(|path| -> anyhow::Result<(String, Value)> {
            let id = path.file_stem().unwrap_or(path.as_str()).to_string();
            Ok((id, read_document(log, path)?))
        })
        .collect()
}

fn print_analysis(analysis: &Analysis) {
    for change in &analysis.changes {
        println!("{}", change_line(change));
    }

    let tally = ChangeTally::from_changes(&analysis.changes);
    if analysis.has_changes {
        println!("{} changes: {}", tally.total(), tally.summary());
    } else {
        println!("no changes");
    }
}

fn change_line(change: &ChangeRecord) -> String {
    let location = match &change.field {
        Some(field) => format!("{} [{field}]", change.path),
        None => change.path.clone(),
    };
    format!(
        "{:<6} {:<20} {location}: {}",
        change.severity.as_str(),
        change.change_type.as_str(),
        change.description,
    )
}

fn tally_line(tally: &ChangeTally) -> String {
    format!(
        "added: {}, removed: {}, modified: {}, renamed: {}",
        tally.added, tally.removed, tally.modified, tally.renamed
    )
}
