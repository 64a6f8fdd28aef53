mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, sample_survey_lines};
use predicates::prelude::*;
use predicates::str::contains;

fn wax() -> Command {
    let mut cmd = Command::cargo_bin("wax-advisor").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn cleaned_workspace() -> (TestWorkspace, std::path::PathBuf) {
    let workspace = TestWorkspace::new();
    let raw = workspace.write_survey("wax_data_seefeld.csv", &sample_survey_lines());
    let snapshot = workspace.path().join("wax_data_clean.csv");
    wax()
        .args([
            "clean",
            "-i",
            raw.to_str().unwrap(),
            "-o",
            snapshot.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("Cleaned 7 row(s)"));
    (workspace, snapshot)
}

#[test]
fn clean_then_recommend_prints_ranked_table() {
    let (_workspace, snapshot) = cleaned_workspace();
    wax()
        .args([
            "recommend",
            "-d",
            snapshot.to_str().unwrap(),
            "--location",
            "Möserer Steig",
            "--air-temp",
            "-4",
            "--snow-type",
            "fresh_cold",
            "--snow-moisture",
            "dry",
        ])
        .assert()
        .success()
        .stdout(contains("avg_rating"))
        .stdout(contains("4.50"))
        .stdout(contains("Grip Green"));
}

#[test]
fn recommend_diagnostic_is_not_a_failure() {
    let (_workspace, snapshot) = cleaned_workspace();
    wax()
        .args([
            "recommend",
            "-d",
            snapshot.to_str().unwrap(),
            "--location",
            "Gschwandtkopf",
            "--air-temp",
            "0",
            "--snow-type",
            "icy",
            "--snow-moisture",
            "wet",
        ])
        .assert()
        .success()
        .stdout(contains("no data for location Gschwandtkopf"));
}

#[test]
fn recommend_json_output_is_tagged() {
    let (_workspace, snapshot) = cleaned_workspace();
    let output = wax()
        .args([
            "recommend",
            "-d",
            snapshot.to_str().unwrap(),
            "--location",
            "Möserer Steig",
            "--air-temp",
            "6",
            "--snow-type",
            "fresh_cold",
            "--snow-moisture",
            "dry",
            "--format",
            "json",
        ])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["outcome"], "diagnostic");
    assert_eq!(value["result"]["stage"], "no_temperature_range");
}

#[test]
fn unknown_snow_type_tag_is_rejected_by_the_parser() {
    let (_workspace, snapshot) = cleaned_workspace();
    wax()
        .args([
            "recommend",
            "-d",
            snapshot.to_str().unwrap(),
            "--location",
            "Möserer Steig",
            "--air-temp",
            "0",
            "--snow-type",
            "Neuschnee kalt",
            "--snow-moisture",
            "dry",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown snow_type"));
}

#[test]
fn options_lists_distinct_values() {
    let (_workspace, snapshot) = cleaned_workspace();
    wax()
        .args(["options", "-d", snapshot.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Möserer Steig"))
        .stdout(contains("Wildmoos"))
        .stdout(contains("artificial"))
        .stdout(contains("normal"))
        .stdout(contains("Pulverschnee").not());
}

#[test]
fn preview_limits_rows() {
    let (_workspace, snapshot) = cleaned_workspace();
    let output = wax()
        .args(["preview", "-d", snapshot.to_str().unwrap(), "--rows", "2"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.lines().next().unwrap().starts_with("timestamp"));
}

#[test]
fn config_file_supplies_paths_and_strictness() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write_survey("raw.csv", &sample_survey_lines());
    let snapshot = workspace.path().join("clean.csv");
    let config = workspace.write(
        "wax.yaml",
        &format!(
            "raw_path: {}\ndataset_path: {}\nstrict_categories: true\n",
            raw.display(),
            snapshot.display()
        ),
    );
    wax()
        .args(["--config", config.to_str().unwrap(), "clean"])
        .assert()
        .failure()
        .stderr(contains("unmapped snow_type text 'Pulverschnee'"));
    assert!(!snapshot.exists());

    let lenient = workspace.write(
        "lenient.yaml",
        &format!(
            "raw_path: {}\ndataset_path: {}\n",
            raw.display(),
            snapshot.display()
        ),
    );
    wax()
        .args(["--config", lenient.to_str().unwrap(), "clean"])
        .assert()
        .success()
        .stderr(contains("Unmapped snow_type text 'Pulverschnee'"));
    assert!(fs::metadata(&snapshot).is_ok());
}

#[test]
fn session_reads_queries_from_stdin() {
    let (_workspace, snapshot) = cleaned_workspace();
    wax()
        .args(["session", "-d", snapshot.to_str().unwrap()])
        .write_stdin("Wildmoos;-10;artificial;normal\nWildmoos;-10;artificial;dry\n")
        .assert()
        .success()
        .stdout(contains("Ultra Mix"))
        .stdout(contains("no data for snow moisture dry"));
}

#[test]
fn missing_snapshot_fails_with_context() {
    let workspace = TestWorkspace::new();
    let absent = workspace.path().join("absent.csv");
    wax()
        .args(["preview", "-d", absent.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("absent.csv"));
}

fn recommend_args<'a>(snapshot: &'a str, air_temp: &'a str) -> Vec<&'a str> {
    vec![
        "recommend",
        "-d",
        snapshot,
        "--location",
        "Möserer Steig",
        "--air-temp",
        air_temp,
        "--snow-type",
        "fresh_cold",
        "--snow-moisture",
        "dry",
    ]
}

#[test]
fn top_flag_overrides_config_limit() {
    let (workspace, snapshot) = cleaned_workspace();
    let config = workspace.write("wax.yaml", "top: 3\n");
    let mut args = vec!["--config", config.to_str().unwrap()];
    args.extend(recommend_args(snapshot.to_str().unwrap(), "-4"));
    args.extend(["--top", "1"]);
    let output = wax().args(&args).output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 3, "{stdout}");
    assert!(stdout.contains("V40"), "{stdout}");
    assert!(!stdout.contains("Grip Green"), "{stdout}");
}

#[test]
fn wider_tolerance_turns_diagnostic_into_ranking() {
    let (_workspace, snapshot) = cleaned_workspace();
    let snapshot = snapshot.to_str().unwrap();
    wax()
        .args(recommend_args(snapshot, "6"))
        .assert()
        .success()
        .stdout(contains("no data for temperature range"));
    wax()
        .args(recommend_args(snapshot, "6"))
        .args(["--tolerance", "10"])
        .assert()
        .success()
        .stdout(contains("V40"))
        .stdout(contains("no data").not());
}

#[test]
fn invalid_limits_are_rejected() {
    let (_workspace, snapshot) = cleaned_workspace();
    let snapshot = snapshot.to_str().unwrap();
    wax()
        .args(recommend_args(snapshot, "-4"))
        .args(["--top", "0"])
        .assert()
        .failure()
        .stderr(contains("--top must be at least 1"));
    for tolerance in ["--tolerance=-1", "--tolerance=NaN"] {
        wax()
            .args(recommend_args(snapshot, "-4"))
            .arg(tolerance)
            .assert()
            .failure()
            .stderr(contains("Tolerance must be a non-negative number"));
    }
}

#[test]
fn strict_headers_flag_rejects_survey_header() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write_survey("raw.csv", &sample_survey_lines());
    let snapshot = workspace.path().join("clean.csv");
    wax()
        .args([
            "clean",
            "-i",
            raw.to_str().unwrap(),
            "-o",
            snapshot.to_str().unwrap(),
            "--strict-headers",
        ])
        .assert()
        .failure()
        .stderr(contains("Header mismatch at position 1"))
        .stderr(contains("Zeitstempel"));
    assert!(!snapshot.exists());
}

#[test]
fn cleans_semicolon_windows_1252_export() {
    let workspace = TestWorkspace::new();
    let text = format!(
        "{}\n{}\n",
        common::SURVEY_HEADER.replace(',', ";"),
        "12.01.2025 08:01:00;Möserer Steig;-4;Neuschnee kalt;Trocken;Swix;V40;5;-7;2"
    );
    let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(&text);
    assert!(!unmappable);
    let raw = workspace.path().join("export.csv");
    fs::write(&raw, &bytes).expect("write export");
    let config = workspace.write("wax.yaml", "delimiter: \"|\"\n");
    let snapshot = workspace.path().join("clean.csv");

    wax()
        .args([
            "--config",
            config.to_str().unwrap(),
            "clean",
            "-i",
            raw.to_str().unwrap(),
            "-o",
            snapshot.to_str().unwrap(),
            "--delimiter",
            ";",
            "--input-encoding",
            "windows-1252",
        ])
        .assert()
        .success()
        .stderr(contains("Cleaned 1 row(s)"));

    let written = fs::read_to_string(&snapshot).expect("utf-8 snapshot");
    assert_eq!(
        written.lines().nth(1),
        Some("12.01.2025 08:01:00,Möserer Steig,-4,fresh_cold,dry,Swix,V40,5,-7,2")
    );
}
