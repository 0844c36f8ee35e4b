//! Smoke tests to verify command module wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fleetctl() -> Command {
    Command::cargo_bin("fleetctl").unwrap()
}

// === Order Command Tests ===

#[test]
fn test_orders_create_help() {
    let mut cmd = fleetctl();
    cmd.arg("orders").arg("create").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Pickup address"))
        .stdout(predicate::str::contains("Package weight in kg"));
}

#[test]
fn test_orders_status_help() {
    let mut cmd = fleetctl();
    cmd.arg("orders").arg("status").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rejection reason"));
}

#[test]
fn test_orders_assign_rejects_conflicting_flags() {
    let mut cmd = fleetctl();
    cmd.args([
        "orders",
        "assign",
        "6f1c2d3e-0000-4000-8000-000000000001",
        "--vehicle",
        "6f1c2d3e-0000-4000-8000-000000000002",
        "--no-vehicle",
    ]);

    cmd.assert().failure();
}

#[test]
fn test_orders_list_unreachable_endpoint() {
    let mut cmd = fleetctl();
    cmd.args(["orders", "list", "--endpoint", "http://127.0.0.1:9"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect"));
}

// === Vehicle / Tracking / Notification Command Tests ===

#[test]
fn test_vehicles_list_help() {
    let mut cmd = fleetctl();
    cmd.arg("vehicles").arg("list").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Filter by status"));
}

#[test]
fn test_track_requires_uuid() {
    let mut cmd = fleetctl();
    cmd.arg("track").arg("not-a-uuid");

    cmd.assert().failure();
}

#[test]
fn test_notifications_read_help() {
    let mut cmd = fleetctl();
    cmd.arg("notifications").arg("read").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Mark unread instead"));
}

// === Serve / Config Command Tests ===

#[test]
fn test_serve_help() {
    let mut cmd = fleetctl();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"));
}

#[test]
fn test_config_path_uses_home() {
    let home = TempDir::new().unwrap();
    let mut cmd = fleetctl();
    cmd.env("HOME", home.path()).arg("config").arg("path");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(".fleetctl"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let home = TempDir::new().unwrap();

    fleetctl()
        .env("HOME", home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config created"));

    assert!(home.path().join(".fleetctl").join("config.toml").exists());

    fleetctl()
        .env("HOME", home.path())
        .env_remove("DATABASE_URL")
        .env_remove("FLEETCTL_BIND")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[tracking]"));

    fleetctl()
        .env("HOME", home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
