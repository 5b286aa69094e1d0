//! End-to-end checks of the `clip-editor` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn clip_editor() -> Command {
    let mut cmd = Command::cargo_bin("clip-editor").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CLIP_EDITOR_SOURCE")
        .env_remove("CLIP_EDITOR_CLIP_FILE")
        .env_remove("CLIP_EDITOR_OUTPUT_DIR");
    cmd
}

fn write_settings(dir: &Path, clip_file: &Path) -> std::path::PathBuf {
    write_settings_with_log(dir, clip_file, &dir.join("ClipEditor"))
}

fn write_settings_with_log(dir: &Path, clip_file: &Path, log_file: &Path) -> std::path::PathBuf {
    let settings = dir.join("settings.yaml");
    let yaml = format!(
        "source_video: {:?}\n\
         clip_file: {:?}\n\
         output_dir: {:?}\n\
         output_pattern: \"{{clip_name}}.mp4\"\n\
         log_file: {:?}\n",
        dir.join("game.mp4"),
        clip_file,
        dir.join("out"),
        log_file,
    );
    fs::write(&settings, yaml).unwrap();
    settings
}

#[test]
fn test_help_lists_options() {
    clip_editor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--clip-file"));
}

#[test]
fn test_missing_config_fails() {
    let temp = TempDir::new().unwrap();
    clip_editor()
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_incomplete_config_fails() {
    let temp = TempDir::new().unwrap();
    let settings = temp.path().join("settings.yaml");
    fs::write(&settings, "source_video: game.mp4\n").unwrap();

    clip_editor()
        .arg("--config")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("clip_file"));
}

#[test]
fn test_missing_clip_table_fails_without_output() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(temp.path(), &temp.path().join("absent.csv"));

    clip_editor()
        .arg("--config")
        .arg(&settings)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Aborting before any clip was processed"))
        .stderr(predicate::str::contains("Clip table not found"));

    assert!(!temp.path().join("out").exists());
    let log = fs::read_to_string(temp.path().join("ClipEditor.log")).unwrap();
    assert!(log.contains("Clip table not found"));
}

#[test]
fn test_clip_file_flag_overrides_settings() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(temp.path(), &temp.path().join("clips.csv"));

    clip_editor()
        .arg("--config")
        .arg(&settings)
        .arg("--clip-file")
        .arg(temp.path().join("other.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("other.csv"));
}

#[test]
fn test_clip_file_env_overrides_settings() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(temp.path(), &temp.path().join("clips.csv"));

    clip_editor()
        .env("CLIP_EDITOR_CLIP_FILE", temp.path().join("from_env.csv"))
        .arg("--config")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("from_env.csv"));
}

#[test]
fn test_unwritable_log_location_fails_with_message() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "plain file").unwrap();
    let settings = write_settings_with_log(
        temp.path(),
        &temp.path().join("clips.csv"),
        &blocker.join("ClipEditor"),
    );

    clip_editor()
        .arg("--config")
        .arg(&settings)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Cannot set up logging"));
    assert!(!temp.path().join("out").exists());
}
