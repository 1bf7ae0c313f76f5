//! Integration tests for the `dmxnode` CLI binary.
//!
//! Argument parsing, help, completions and error exit codes run without a
//! device; the request tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// A `dmxnode` command isolated from the user's config, keyring and env.
fn dmxnode_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("dmxnode");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("DBUS_SESSION_BUS_ADDRESS")
        .env_remove("DMXNODE_PROFILE")
        .env_remove("DMXNODE_ADDRESS")
        .env_remove("DMXNODE_OUTPUT")
        .env_remove("DMXNODE_INSECURE")
        .env_remove("DMXNODE_TIMEOUT_MS")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = dmxnode_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_the_commands() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("watch")
                .and(predicate::str::contains("port"))
                .and(predicate::str::contains("factory-reset"))
                .and(predicate::str::contains("ota")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dmxnode"));
}

#[test]
fn completions_for_each_shell() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
    for shell in ["bash", "fish"] {
        dmxnode_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn unknown_subcommand_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = dmxnode_cmd(home.path()).arg("dimmer").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("dimmer"));
}

#[test]
fn status_without_a_device_explains_setup() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No device configured"));
}

#[test]
fn unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["-p", "booth", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Profile 'booth' not found"));
}

#[test]
fn empty_port_edit_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["-a", "127.0.0.1:9", "port", "set", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to change"));
}

#[test]
fn enable_and_disable_conflict() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["-a", "127.0.0.1:9", "port", "set", "1", "--enable", "--disable"])
        .assert()
        .code(2);
}

#[test]
fn destructive_commands_need_yes_without_a_terminal() {
    let home = tempfile::tempdir().unwrap();
    for command in ["reboot", "factory-reset"] {
        dmxnode_cmd(home.path())
            .args(["-a", "127.0.0.1:9", command])
            .write_stdin("")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--yes"));
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_set_then_show_and_profiles() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["-p", "stage", "config", "set", "address", "10.0.0.7"])
        .assert()
        .success();
    dmxnode_cmd(home.path())
        .args(["-p", "stage", "config", "set", "poll.dmx_ms", "250"])
        .assert()
        .success();
    dmxnode_cmd(home.path())
        .args(["config", "use", "stage"])
        .assert()
        .success();

    dmxnode_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("default_profile = \"stage\"")
                .and(predicate::str::contains("address = \"10.0.0.7\""))
                .and(predicate::str::contains("dmx_ms = 250")),
        );
    dmxnode_cmd(home.path())
        .args(["-o", "plain", "config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::diff("stage\n"));
}

#[test]
fn config_set_rejects_unknown_keys() {
    let home = tempfile::tempdir().unwrap();
    dmxnode_cmd(home.path())
        .args(["config", "set", "site", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown key"));
}

// ── Against a device ────────────────────────────────────────────────

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/sys/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_id": "node-7", "firmware_version": "1.4.2", "uptime": 3661,
            "cpu_load": 12.5, "free_heap": 120000
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dmx/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ports": [
                { "port": 0, "universe": 1, "enabled": true, "break_us": 176, "mab_us": 12, "fps": 44 },
                { "port": 1, "universe": 2, "enabled": false, "break_us": 176, "mab_us": 12 }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/network/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eth_up": true, "wifi_up": false, "eth_ip": "10.0.0.5"
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn status_json_reports_every_domain() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    let home = tempfile::tempdir().unwrap();

    let output = dmxnode_cmd(home.path())
        .args(["-a", &server.uri(), "-o", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["system"]["device_id"], "node-7");
    assert_eq!(report["ports"][0]["universe"], 1);
    assert_eq!(report["ports"][1]["enabled"], false);
    assert_eq!(report["network"]["eth_ip"], "10.0.0.5");
}

#[tokio::test(flavor = "multi_thread")]
async fn port_set_posts_the_merged_port() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/dmx/config"))
        .and(body_json(json!({
            "ports": [
                { "port": 1, "universe": 9, "enabled": true, "break_us": 176, "mab_us": 12 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    dmxnode_cmd(home.path())
        .args(["-a", &server.uri(), "port", "set", "1", "-u", "9", "--enable"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Port 1 saved"));
}

#[tokio::test(flavor = "multi_thread")]
async fn device_rejection_maps_to_its_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sys/reboot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false, "error": "ota in progress"
        })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    dmxnode_cmd(home.path())
        .args(["-a", &server.uri(), "-y", "reboot"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("ota in progress"));
}

#[tokio::test(flavor = "multi_thread")]
async fn export_writes_the_device_file() {
    let server = MockServer::start().await;
    let document = json!({
        "device_label": "truss-a",
        "led_brightness": 40,
        "network": {
            "dhcp": true, "static_ip": "", "static_netmask": "", "static_gateway": "",
            "wifi_ssid": "", "wifi_psk": "", "wifi_enabled": false, "eth_enabled": true
        },
        "ports": [
            { "index": 0, "enabled": true, "universe": 1, "protocol": 0, "break_us": 176, "mab_us": 12 }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/file/export"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let target = home.path().join("truss-a.json");

    dmxnode_cmd(home.path())
        .args(["-a", &server.uri(), "export", "-f"])
        .arg(&target)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["device_label"], "truss-a");
    assert_eq!(written["ports"][0]["universe"], 1);
}
