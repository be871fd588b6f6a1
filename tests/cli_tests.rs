//! CLI integration tests using the real ondemand binary

mod common;

use common::TestDevice;
use predicates::prelude::*;

#[test]
fn test_help_output() {
    TestDevice::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ondemand installs feature modules"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("defer-uninstall"))
        .stdout(predicate::str::contains("settle"));
}

#[test]
fn test_version_output() {
    TestDevice::new()
        .cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ondemand"))
        .stdout(predicate::str::contains("Build info"));
}

#[test]
fn test_list_fresh_device() {
    TestDevice::new()
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Modules (4):"))
        .stdout(predicate::str::contains("image_feature: not installed"))
        .stdout(predicate::str::contains("Entry: image::ImageViewer"));
}

#[test]
fn test_install_launches_module() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["install", "image_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed image_feature"))
        .stdout(predicate::str::contains(
            "Launching image_feature (image::ImageViewer)",
        ));

    let state = device.device_json();
    assert_eq!(state["installed"], serde_json::json!(["image_feature"]));
}

#[test]
fn test_install_twice_short_circuits() {
    let device = TestDevice::new();
    device
        .cmd()
        .args(["install", "image_feature", "--no-launch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Launching").not());

    device
        .cmd()
        .args(["install", "image_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already installed image_feature"))
        .stdout(predicate::str::contains("Launching image_feature"));

    // the second request never reached the device
    assert_eq!(device.device_json()["next_session"], 1);
}

#[test]
fn test_large_install_with_yes() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["install", "image_large_feature", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Launching image_large_feature"));
}

#[test]
fn test_large_install_without_terminal_fails_cleanly() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["install", "image_large_feature"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pass --yes"));

    device
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("image_large_feature: not installed"));
}

#[test]
fn test_install_unknown_module_is_rejected() {
    TestDevice::new()
        .cmd()
        .args(["install", "video_feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("was rejected"))
        .stderr(predicate::str::contains("video_feature"));
}

#[test]
fn test_install_failure_reports_code() {
    TestDevice::new()
        .cmd()
        .args(["install", "broken_feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed with error code -6"));
}

#[test]
fn test_install_without_entry_point_does_not_launch() {
    TestDevice::new()
        .cmd()
        .args(["install", "headless_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed headless_feature"))
        .stdout(predicate::str::contains("Launching").not());
}

#[test]
fn test_launch_requires_install() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["launch", "image_feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Module 'image_feature' is not installed",
        ));

    device
        .cmd()
        .args(["install", "image_feature", "--no-launch"])
        .assert()
        .success();

    device
        .cmd()
        .args(["launch", "image_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Launching image_feature (image::ImageViewer)",
        ));
}

#[test]
fn test_deferred_uninstall_round_trip() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["install", "image_feature", "--no-launch"])
        .assert()
        .success();

    device
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("image_feature: installed"));

    device
        .cmd()
        .arg("defer-uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Queued background uninstall of image_feature",
        ));

    device
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "image_feature: installed, uninstall pending",
        ));

    device
        .cmd()
        .arg("settle")
        .assert()
        .success()
        .stdout(predicate::str::contains("Uninstalled image_feature"));

    device
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("image_feature: not installed"));
}

#[test]
fn test_defer_uninstall_absent_module_is_noop() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["defer-uninstall", "image_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to uninstall"));

    device
        .cmd()
        .arg("settle")
        .assert()
        .success()
        .stdout(predicate::str::contains("No background changes"));
}

#[test]
fn test_defer_install_then_settle() {
    let device = TestDevice::new();

    device
        .cmd()
        .args(["defer-install", "image_feature", "image_large_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued background install"));

    device
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "image_large_feature: not installed, install pending",
        ));

    device
        .cmd()
        .arg("settle")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Installed image_feature, image_large_feature",
        ));

    device
        .cmd()
        .args(["defer-install", "image_feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to install"));
}

#[test]
fn test_defer_install_unknown_module() {
    TestDevice::new()
        .cmd()
        .args(["defer-install", "video_feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown module 'video_feature'"));
}

#[test]
fn test_invalid_module_name() {
    TestDevice::new()
        .cmd()
        .args(["launch", "bad name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid module name"));
}

#[test]
fn test_missing_config_file() {
    let device = TestDevice::new();

    device
        .cmd()
        .env("ONDEMAND_CONFIG", device.path.join("missing.yaml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_default_modules_without_config() {
    let device = TestDevice::new();
    std::fs::remove_file(&device.config_path).unwrap();

    device
        .cmd()
        .env_remove("ONDEMAND_CONFIG")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Modules (2):"))
        .stdout(predicate::str::contains("image_large_feature"));
}

#[test]
fn test_completions_bash() {
    TestDevice::new()
        .cmd()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ondemand"));
}

#[test]
fn test_completions_unknown_shell() {
    TestDevice::new()
        .cmd()
        .args(["completions", "--shell", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported shell: tcsh"));
}
