//! Integration tests for the countmap binary.
//!
//! These tests run the CLI against a file-backed count store in a temporary
//! directory. The geocoder points at a closed local port, so every location
//! lookup fails and is tolerated.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get a command for running countmap, isolated from the user's config.
fn countmap(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("countmap").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("COUNTMAP_CONFIG")
        .env_remove("COUNTMAP_STORE_TOKEN")
        .env_remove("COUNTMAP_MONGODB_URI")
        .env_remove("RUST_LOG")
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"));
    cmd
}

/// Write a config using the file store and an unreachable geocoder.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("countmap.toml")
        .write_str(
            r#"
codes_file = "codes.json"
artifact_path = "out/map.html"

[store]
kind = "file"
path = "records.json"

[geocoder]
base_url = "http://127.0.0.1:9"
timeout_secs = 1
"#,
        )
        .unwrap();
    dir.child("codes.json")
        .write_str(r#"{ "250": "France", "148": "Chad", "9–11": "Testland" }"#)
        .unwrap();
    dir.child("records.json")
        .write_str(r#"[{ "code": "2501" }, { "code": 2502 }, { "code": "10" }, { "code": "115" }]"#)
        .unwrap();
    dir
}

mod pattern {
    use super::*;

    #[test]
    fn single_code_prints_prefix_pattern() {
        let dir = TempDir::new().unwrap();
        countmap(&dir)
            .args(["pattern", "250"])
            .assert()
            .success()
            .stdout("^250\n");
    }

    #[test]
    fn range_prints_anchored_pattern() {
        let dir = TempDir::new().unwrap();
        countmap(&dir)
            .args(["pattern", "9–11"])
            .assert()
            .success()
            .stdout("^(?:9|1[0-1])$\n");
    }

    #[test]
    fn ascii_hyphen_is_rejected() {
        let dir = TempDir::new().unwrap();
        countmap(&dir)
            .args(["pattern", "9-11"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid code '9-11'"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        countmap(&dir)
            .args(["pattern", "11–9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid code range"));
    }
}

mod create_map {
    use super::*;

    #[test]
    fn writes_map_and_reports_json() {
        let dir = workspace();

        let output = countmap(&dir)
            .args(["create-map", "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(report["aggregated"], 3);
        assert_eq!(report["non_empty"], 2);
        assert_eq!(report["codes_resolved"], 1);
        assert_eq!(report["codes_unknown"], 1);
        assert_eq!(report["markers"], 0);
        assert_eq!(report["metadata_injected"], false);

        dir.child("out/map.html")
            .assert(predicate::str::contains("leaflet.markercluster.js"));
    }

    #[test]
    fn out_and_inject_metadata_flags() {
        let dir = workspace();

        countmap(&dir)
            .args(["create-map", "--out", "alt.html", "--inject-metadata"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Map written to alt.html"));

        dir.child("alt.html")
            .assert(predicate::str::contains("<title>MSB Map</title>"));
        dir.child("out/map.html").assert(predicate::path::missing());
    }

    #[test]
    fn quiet_suppresses_report() {
        let dir = workspace();

        countmap(&dir)
            .args(["--quiet", "create-map"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn missing_store_fails_at_aggregate_and_keeps_previous_map() {
        let dir = workspace();
        std::fs::remove_file(dir.child("records.json").path()).unwrap();
        dir.child("out/map.html").write_str("previous").unwrap();

        countmap(&dir)
            .arg("create-map")
            .assert()
            .failure()
            .stderr(predicate::str::contains("step 'aggregate'"))
            .stderr(predicate::str::contains("count store unavailable"));

        dir.child("out/map.html").assert("previous");
    }

    #[test]
    fn invalid_specification_fails_at_spec() {
        let dir = workspace();
        dir.child("codes.json")
            .write_str(r#"{ "250": "France", "9-11": "Testland" }"#)
            .unwrap();

        countmap(&dir)
            .arg("create-map")
            .assert()
            .failure()
            .stderr(predicate::str::contains("step 'spec'"));

        dir.child("out/map.html").assert(predicate::path::missing());
    }

    #[test]
    fn missing_codes_file_is_reported() {
        let dir = workspace();

        countmap(&dir)
            .args(["create-map", "--codes", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nope.json"));
    }
}

mod inject_metadata {
    use super::*;

    #[test]
    fn patches_existing_map_idempotently() {
        let dir = workspace();
        dir.child("out/map.html")
            .write_str("<html><head><title>Old</title></head><body></body></html>")
            .unwrap();

        countmap(&dir).arg("inject-metadata").assert().success();
        let once = std::fs::read_to_string(dir.child("out/map.html").path()).unwrap();
        countmap(&dir).arg("inject-metadata").assert().success();
        let twice = std::fs::read_to_string(dir.child("out/map.html").path()).unwrap();

        assert_eq!(once, twice);
        assert!(once.contains("<title>MSB Map</title>"));
        assert!(once.contains(r#"<link rel="icon" href="/static/MSB_Logo_transparent.png" />"#));
    }

    #[test]
    fn missing_map_fails() {
        let dir = workspace();

        countmap(&dir)
            .args(["inject-metadata", "--out", "missing.html"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing.html"));
    }
}

mod config {
    use super::*;

    #[test]
    fn show_prints_effective_values() {
        let dir = workspace();

        countmap(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Loaded from countmap.toml"))
            .stdout(predicate::str::contains(r#"kind = "file""#))
            .stdout(predicate::str::contains(r#"quantity_label = "Medicines""#));
    }

    #[test]
    fn path_without_config_prints_nothing() {
        let dir = TempDir::new().unwrap();

        countmap(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn explicit_config_is_used() {
        let dir = workspace();
        dir.child("other.toml")
            .write_str("[map]\ntitle = \"Other\"\n")
            .unwrap();

        countmap(&dir)
            .args(["config", "show", "--config", "other.toml"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"title = "Other""#));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        dir.child("countmap.toml").write_str("colour = 1\n").unwrap();

        countmap(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load configuration"));
    }
}

#[test]
fn completion_generates_script() {
    let dir = TempDir::new().unwrap();
    countmap(&dir)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("countmap"));
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    countmap(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create-map"))
        .stdout(predicate::str::contains("inject-metadata"));
}
