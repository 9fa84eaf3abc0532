//! CLI end-to-end tests.
//!
//! These avoid the real geospatial tools: scenarios either stop before
//! any invocation (no sources present) or never execute (--dry-run).

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn tilefuse_cmd() -> Command {
    Command::cargo_bin("tilefuse").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = tilefuse_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = tilefuse_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tilefuse"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_subcommand() {
    let mut cmd = tilefuse_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tilefuse"));
}

#[test]
fn test_cli_plan_prints_default_groups() {
    let mut cmd = tilefuse_cmd();
    cmd.arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("1985-1989: 1985, 1986, 1987, 1988, 1989"))
        .stdout(predicate::str::contains("2020-2023: 2020, 2021, 2022, 2023"));
}

#[test]
fn test_cli_plan_with_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("tilefuse.toml");
    fs::write(
        &config_file,
        r#"
[dataset]
first_year = 2000
last_year = 2005
group_width = 3
"#,
    )
    .unwrap();

    let mut cmd = tilefuse_cmd();
    cmd.args(["plan", "--config", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2000-2002: 2000, 2001, 2002"))
        .stdout(predicate::str::contains("2003-2005: 2003, 2004, 2005"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("tilefuse.toml");
    fs::write(
        &config_file,
        r#"
[dataset]
group_width = 0
"#,
    )
    .unwrap();

    let mut cmd = tilefuse_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("group_width"));
}

#[test]
fn test_cli_validate_defaults() {
    let mut cmd = tilefuse_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1985-2023 in groups of 5"));
}

#[test]
fn test_cli_run_empty_sources_fails_with_summary() {
    let temp = tempdir().unwrap();
    let sources = temp.path().join("sources");
    fs::create_dir_all(&sources).unwrap();

    let mut cmd = tilefuse_cmd();
    cmd.args([
        "run",
        "--source-dir",
        sources.to_str().unwrap(),
        "--output-dir",
        temp.path().join("consolidated").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::contains("CONSOLIDATION SUMMARY"))
    .stdout(predicate::str::contains("FAIL"))
    .stdout(predicate::str::contains("Groups: 0/8 succeeded"));
}

#[test]
fn test_cli_run_json_summary() {
    let temp = tempdir().unwrap();
    let sources = temp.path().join("sources");
    fs::create_dir_all(&sources).unwrap();

    let mut cmd = tilefuse_cmd();
    cmd.args([
        "run",
        "--json",
        "--source-dir",
        sources.to_str().unwrap(),
        "--output-dir",
        temp.path().join("consolidated").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stdout(predicate::str::contains("\"groups_succeeded\": 0"))
    .stdout(predicate::str::contains("\"variant\": \"merged\""));
}

#[test]
fn test_cli_run_dry_run_touches_nothing() {
    let temp = tempdir().unwrap();
    let sources = temp.path().join("sources");
    fs::create_dir_all(&sources).unwrap();
    // One plausible source so the dry run prints a real command.
    fs::write(sources.join("lulc_nat_ant_1985_gpu.pmtiles"), b"src").unwrap();

    let output_dir = temp.path().join("consolidated");
    let mut cmd = tilefuse_cmd();
    cmd.args([
        "run",
        "--dry-run",
        "--source-dir",
        sources.to_str().unwrap(),
        "--output-dir",
        output_dir.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("# dry run"))
    .stdout(predicate::str::contains("ogr2ogr"))
    .stdout(predicate::str::contains("source missing"));

    // Nothing was created.
    assert!(!output_dir.exists());
}

#[test]
fn test_cli_check_tools_reports_each_tool() {
    let mut cmd = tilefuse_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ogr2ogr"))
        .stdout(predicate::str::contains("tippecanoe"))
        .stdout(predicate::str::contains("pmtiles"));
}
