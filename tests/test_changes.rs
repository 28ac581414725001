// Copyright 2026 Oxide Computer Company

//! Each directory under `tests/cases` holds a `base.json` document, a set of
//! RFC 6902 patches under `patch/`, and for each patch the changes expected
//! between the base and the patched document under `output/`.
//!
//! Expected records only need to list the members they pin down; members left
//! out of an expected record are not checked.

use std::path::Path;

use apitrack::analyze_changes;
use serde_json::Value;

fn read_json(path: &Path) -> Value {
    let contents = std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("reading {}: {err}", path.display()));
    serde_json::from_str(&contents)
        .unwrap_or_else(|err| panic!("parsing {}: {err}", path.display()))
}

#[track_caller]
fn check_changes(patch_name: &str, actual: &[Value], expected: &[Value]) {
    let actual_summary = actual
        .iter()
        .map(|change| format!("{} {} {}", change["type"], change["path"], change["field"]))
        .collect::<Vec<_>>();
    assert_eq!(
        actual.len(),
        expected.len(),
        "{patch_name}: wrong number of changes: {actual_summary:#?}"
    );

    for (index, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        let expected = expected
            .as_object()
            .unwrap_or_else(|| panic!("{patch_name}: expected change {index} is not an object"));
        for (key, expected_value) in expected {
            assert_eq!(
                &actual[key], expected_value,
                "{patch_name}: change {index} differs in {key:?}: {actual:#}"
            );
        }
    }
}

#[test]
fn test_change() {
    let cases_dir = Path::new("tests/cases");
    let mut cases = 0;
    for entry in std::fs::read_dir(cases_dir).unwrap() {
        let path = entry.unwrap().path();
        if !path.is_dir() {
            continue;
        }
        let case_name = path.file_name().unwrap().to_str().unwrap().to_string();
        println!("Running case: {case_name}");
        cases += 1;

        let base_value = read_json(&path.join("base.json"));

        // Start by making sure that the base compares cleanly against itself.
        let result = analyze_changes(&base_value, &base_value);
        assert!(!result.has_changes, "{case_name}: base differs from itself");
        assert!(result.changes.is_empty());

        let patch_dir = path.join("patch");
        let output_dir = path.join("output");
        let mut patches = 0;
        for patch_entry in std::fs::read_dir(&patch_dir).unwrap() {
            let patch_path = patch_entry.unwrap().path();
            if !patch_path.is_file() {
                continue;
            }
            let patch_name = format!(
                "{case_name}/{}",
                patch_path.file_name().unwrap().to_string_lossy()
            );
            println!("  Considering patch {patch_name}");
            patches += 1;

            let patch: json_patch::Patch =
                serde_json::from_value(read_json(&patch_path)).unwrap();
            let mut patched = base_value.clone();
            json_patch::patch(&mut patched, &patch).unwrap();

            let analysis = analyze_changes(&base_value, &patched);
            assert_eq!(analysis.has_changes, !analysis.changes.is_empty());

            let actual = analysis
                .changes
                .iter()
                .map(|change| serde_json::to_value(change).unwrap())
                .collect::<Vec<_>>();
            let expected = read_json(&output_dir.join(patch_path.file_name().unwrap()));
            let expected = expected.as_array().unwrap();
            check_changes(&patch_name, &actual, expected);

            // Every patch changes something, so undoing it does too.
            assert!(!analyze_changes(&patched, &patched).has_changes);
            assert!(analyze_changes(&patched, &base_value).has_changes);
        }
        assert!(patches > 0, "{case_name}: no patches");
    }
    assert!(cases > 0, "no test cases found");
}
