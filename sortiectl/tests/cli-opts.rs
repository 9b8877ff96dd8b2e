use std::fs;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

const BIN: &str = "sortiectl";

#[test]
fn test_empty_args() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.assert().failure();
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("-h").assert().success();
}

#[test]
fn test_version_opt() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("-V").assert().failure();
}

#[test]
fn test_help_keyword() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("help").assert().success();
}

#[test]
fn test_version_keyword() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("version").assert().success();
}

#[test]
fn test_bad_keyword() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("bouh").assert().failure();
}

#[test]
fn test_list_empty() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("list").assert().failure();
}

#[test]
fn test_list_formats() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env("HOME", dir.path())
        .arg("list")
        .arg("formats")
        .assert()
        .success();
}

// ------ end to end, against a throwaway logbook

/// Config file in a fresh directory, store next to it.
fn scratch_config() -> (TempDir, String) {
    let dir = tempdir().unwrap();
    let store = dir.path().join("sortie.json");
    let cfg = dir.path().join("sortiectl.hcl");
    fs::write(&cfg, format!("version = 1\nstore = {:?}\n", store)).unwrap();
    (dir, cfg.to_string_lossy().to_string())
}

fn sortiectl(cfg: &str) -> Command {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("-c").arg(cfg);
    cmd
}

#[test]
fn test_pilot_roundtrip() {
    let (_dir, cfg) = scratch_config();

    sortiectl(&cfg)
        .args(["pilot", "add", "marcel", "--default"])
        .assert()
        .success();

    let out = sortiectl(&cfg).args(["list", "pilots"]).assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("marcel"));
    assert!(stdout.contains('*'));
}

#[test]
fn test_duplicate_pilot_fails() {
    let (_dir, cfg) = scratch_config();

    sortiectl(&cfg)
        .args(["pilot", "add", "marcel"])
        .assert()
        .success();
    sortiectl(&cfg)
        .args(["pilot", "add", "marcel"])
        .assert()
        .failure();
}

#[test]
fn test_import_one_dji_file() {
    let (dir, cfg) = scratch_config();

    let logs = dir.path().join("logs");
    fs::create_dir(&logs).unwrap();
    let mut body = String::from(
        "CUSTOM.dateTime,OSD.latitude,OSD.longitude,OSD.height,OSD.xSpeed,OSD.ySpeed,\
RC.downlinkSignal,RC.uplinkSignal,RECOVER.aircraftName,DETAILS.aircraftName\n",
    );
    for i in 0..5 {
        body.push_str(&format!(
            "2024-06-01T10:00:{:02}Z,48.0,2.0,12.0,1.0,2.0,90,95,Avata,\n",
            i * 10
        ));
    }
    fs::write(logs.join("Avata-1.csv"), body).unwrap();

    sortiectl(&cfg)
        .args(["pilot", "add", "marcel", "--default"])
        .assert()
        .success();

    let out = sortiectl(&cfg)
        .args(["import", "-d", logs.to_str().unwrap()])
        .assert()
        .success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Imported 1 files"));
    assert!(stdout.contains("processed"));

    let out = sortiectl(&cfg).args(["list", "flights"]).assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Avata"));
    assert!(stdout.contains("2024-06-01"));
}

#[test]
fn test_import_missing_directory_fails() {
    let (dir, cfg) = scratch_config();

    sortiectl(&cfg)
        .args([
            "import",
            "-P",
            "marcel",
            "-d",
            dir.path().join("nowhere").to_str().unwrap(),
        ])
        .assert()
        .failure();
}

#[test]
fn test_stats_dashboard_on_empty_logbook() {
    let (_dir, cfg) = scratch_config();

    sortiectl(&cfg)
        .args(["stats", "dashboard"])
        .assert()
        .success();
}
