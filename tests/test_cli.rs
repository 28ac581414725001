// Copyright 2026 Oxide Computer Company

//! Tests of the `apitrack` binary.

use std::path::{Path, PathBuf};

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn apitrack() -> Command {
    cargo_bin_cmd!("apitrack")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn documents() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let old = write_json(
        dir.path(),
        "1-old.json",
        &json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1.0.0"},
            "paths": {"/v1/pets": {"get": {"operationId": "listPets"}}},
        }),
    );
    let new = write_json(
        dir.path(),
        "2-new.json",
        &json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1.0.0"},
            "paths": {
                "/v2/pets": {"get": {"operationId": "listPets"}},
                "/v2/owners": {"get": {}},
            },
        }),
    );
    (dir, old, new)
}

#[test]
fn help() {
    apitrack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Track and classify changes between OpenAPI document revisions",
        ));
}

#[test]
fn diff_with_changes_exits_1() {
    let (_dir, old, new) = documents();
    apitrack()
        .arg("diff")
        .arg(&old)
        .arg(&new)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "high   added                GET /v2/owners: endpoint added: GET /v2/owners",
        ))
        .stdout(predicate::str::contains(
            "medium path_version_changed GET /v2/pets [path]",
        ))
        .stdout(predicate::str::contains("2 changes: 1 added, 1 renamed"));
}

#[test]
fn diff_without_changes_exits_0() {
    let (_dir, old, _) = documents();
    apitrack()
        .arg("diff")
        .arg(&old)
        .arg(&old)
        .assert()
        .success()
        .stdout("no changes\n");
}

#[test]
fn diff_json() {
    let (_dir, old, new) = documents();
    let output = apitrack()
        .args(["diff", "--json"])
        .arg(&old)
        .arg(&new)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let analysis: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(analysis["hasChanges"], true);
    assert_eq!(analysis["changes"][0]["type"], "added");
    assert_eq!(analysis["changes"][1]["type"], "path_version_changed");
}

#[test]
fn diff_raw() {
    let (_dir, old, new) = documents();
    let output = apitrack()
        .args(["diff", "--raw"])
        .arg(&old)
        .arg(&new)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let patch: json_patch::Patch = serde_json::from_slice(&output.stdout).unwrap();
    let mut patched: Value =
        serde_json::from_str(&std::fs::read_to_string(&old).unwrap()).unwrap();
    json_patch::patch(&mut patched, &patch).unwrap();
    let new: Value = serde_json::from_str(&std::fs::read_to_string(&new).unwrap()).unwrap();
    assert_eq!(patched, new);
}

#[test]
fn diff_unified() {
    let (_dir, old, new) = documents();
    apitrack()
        .args(["diff", "--unified"])
        .arg(&old)
        .arg(&new)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("--- old\n+++ new\n"))
        .stdout(predicate::str::contains("+    \"/v2/owners\": {"));
}

#[test]
fn diff_failures_exit_2() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{not json").unwrap();

    apitrack()
        .arg("diff")
        .arg(&bad)
        .arg(&bad)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse"));

    apitrack()
        .arg("diff")
        .arg(dir.path().join("missing.json"))
        .arg(&bad)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));

    apitrack()
        .args(["diff", "--json", "--raw", "a.json", "b.json"])
        .assert()
        .code(2);
}

#[test]
fn normalize() {
    apitrack()
        .args(["normalize", "/api/v2/users", "/health"])
        .assert()
        .success()
        .stdout("/api/v2/users\t/api/{VERSION}/users\t/v2\n/health\t/health\t-\n");
}

#[test]
fn recompute() {
    let (dir, _, _) = documents();
    write_json(
        dir.path(),
        "3-newer.json",
        &json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1.1.0"},
            "paths": {"/v2/pets": {"get": {"operationId": "listPets"}}},
        }),
    );
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    apitrack()
        .arg("recompute")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1-old: first version, skipped"))
        .stdout(predicate::str::contains(
            "2-new: 2 changes since 1-old (added: 1, removed: 0, modified: 0, renamed: 1)",
        ))
        .stdout(predicate::str::contains(
            "3-newer: 2 changes since 2-new (added: 0, removed: 1, modified: 1, renamed: 0)",
        ))
        .stdout(predicate::str::contains(
            "total: added: 1, removed: 1, modified: 1, renamed: 1",
        ));
}

#[test]
fn config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("apitrack.toml");
    std::fs::write(&config, "[log]\nmode = \"stderr-terminal\"\nlevel = \"error\"\n").unwrap();

    apitrack()
        .arg("--config")
        .arg(&config)
        .args(["normalize", "/v1"])
        .assert()
        .success();

    std::fs::write(&config, "[log]\nmode = \"syslog\"\n").unwrap();
    apitrack()
        .arg("--config")
        .arg(&config)
        .args(["normalize", "/v1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse config file"));
}
