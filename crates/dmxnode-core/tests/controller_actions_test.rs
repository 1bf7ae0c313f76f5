#![allow(clippy::unwrap_used)]
// User actions and edit commits against a wiremock device.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dmxnode_api::models::{
    DeviceConfigFile, ExportedPort, NetworkConfig, WifiStationConfig,
};
use dmxnode_api::{DeviceEndpoint, MemoryTokenStore};
use dmxnode_core::{Controller, ControllerConfig, CoreError, Domain, PortEdit};

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    let config = ControllerConfig::new(DeviceEndpoint::parse(&server.uri()).unwrap());
    let ctrl = Controller::new(config, Arc::new(MemoryTokenStore::new())).unwrap();
    (server, ctrl)
}

async fn mount_dmx_status(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/dmx/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ports": [
                { "port": 1, "universe": 3, "enabled": true, "break_us": 176, "mab_us": 12, "fps": 40 }
            ]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ── Edit commits ────────────────────────────────────────────────────

#[tokio::test]
async fn save_port_posts_local_values_and_clears_dirty() {
    let (server, ctrl) = setup().await;
    mount_dmx_status(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/dmx/config"))
        .and(body_json(json!({
            "ports": [
                { "port": 1, "universe": 5, "enabled": true, "break_us": 176, "mab_us": 12 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "data": { "status": "saved" }, "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    ctrl.refresh(Domain::DmxPorts).await.unwrap();
    let ack = ctrl
        .save_port(
            1,
            &PortEdit {
                universe: Some(5),
                ..PortEdit::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(ack.status.as_deref(), Some("saved"));
    assert!(!ctrl.is_dirty(1));
}

#[tokio::test]
async fn failed_save_keeps_edit_and_refreshes() {
    let (server, ctrl) = setup().await;
    mount_dmx_status(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/api/dmx/config"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "flash write failed" })),
        )
        .mount(&server)
        .await;

    ctrl.refresh(Domain::DmxPorts).await.unwrap();
    let err = ctrl
        .save_port(
            1,
            &PortEdit {
                universe: Some(5),
                ..PortEdit::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        CoreError::Api { message, status } => {
            assert_eq!(message, "flash write failed");
            assert_eq!(status, Some(500));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(ctrl.is_dirty(1));
    let port = ctrl.stores().dmx.value().unwrap().get(1).cloned().unwrap();
    assert_eq!(port.universe, 5);
    assert_eq!(port.fps, Some(40.0));
}

#[tokio::test]
async fn invalid_edit_never_reaches_the_device() {
    let (server, ctrl) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/dmx/config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = ctrl
        .save_port(
            2,
            &PortEdit {
                break_us: Some(40),
                ..PortEdit::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { field: "break_us", .. }));

    let err = ctrl.begin_edit(4).unwrap_err();
    assert!(matches!(err, CoreError::Validation { field: "port", .. }));
}

#[tokio::test]
async fn commit_rejected_by_envelope_keeps_dirty() {
    let (server, ctrl) = setup().await;
    mount_dmx_status(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/dmx/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false, "data": null, "error": "universe in use"
        })))
        .mount(&server)
        .await;

    ctrl.refresh(Domain::DmxPorts).await.unwrap();
    ctrl.edit_port(
        1,
        &PortEdit {
            enabled: Some(false),
            ..PortEdit::default()
        },
    )
    .unwrap();
    let err = ctrl.commit_edit(1).await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { ref message } if message == "universe in use"));
    assert!(ctrl.is_dirty(1));
}

// ── Other actions ───────────────────────────────────────────────────

#[tokio::test]
async fn network_config_is_validated_then_posted() {
    let (server, ctrl) = setup().await;
    let good = NetworkConfig {
        wifi_sta: Some(WifiStationConfig {
            enabled: true,
            ssid: "stage-left".into(),
            password: "lightsup123".into(),
        }),
        ..NetworkConfig::default()
    };
    Mock::given(method("POST"))
        .and(path("/api/network/config"))
        .and(body_json(serde_json::to_value(&good).unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut bad = good.clone();
    if let Some(sta) = bad.wifi_sta.as_mut() {
        sta.password = "short".into();
    }
    let err = ctrl.save_network_config(&bad).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { field: "wifi_sta.password", .. }));

    ctrl.save_network_config(&good).await.unwrap();
}

#[tokio::test]
async fn export_then_import_sends_the_same_document() {
    let (server, ctrl) = setup().await;
    let exported = json!({
        "device_label": "truss-a",
        "led_brightness": 40,
        "network": {
            "dhcp": true, "static_ip": "", "static_netmask": "", "static_gateway": "",
            "wifi_ssid": "", "wifi_psk": "", "wifi_enabled": false, "eth_enabled": true
        },
        "ports": [
            { "index": 0, "enabled": true, "universe": 1, "protocol": 0, "break_us": 176, "mab_us": 12 }
        ],
        "failsafe": { "mode": "hold", "timeout_ms": 2000 },
        "schema": 3
    });
    Mock::given(method("GET"))
        .and(path("/api/file/export"))
        .respond_with(ResponseTemplate::new(200).set_body_json(exported.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/file/import"))
        .and(body_json(exported))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let file = ctrl.export_config().await.unwrap();
    ctrl.import_config(&file).await.unwrap();
}

#[tokio::test]
async fn import_rejects_unknown_ports_locally() {
    let (_server, ctrl) = setup().await;
    let mut file = DeviceConfigFile::default();
    file.ports.push(ExportedPort {
        index: 7,
        ..ExportedPort::default()
    });
    let err = ctrl.import_config(&file).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { field: "port", .. }));
}

#[tokio::test]
async fn empty_passwords_and_images_are_rejected() {
    let (_server, ctrl) = setup().await;
    let empty = SecretString::from(String::new());
    assert!(matches!(
        ctrl.login(&empty).await,
        Err(CoreError::Validation { field: "password", .. })
    ));
    assert!(matches!(
        ctrl.set_password(&empty).await,
        Err(CoreError::Validation { field: "password", .. })
    ));

    let image = tempfile::NamedTempFile::new().unwrap();
    let result = ctrl.upload_firmware(image.path()).await;
    assert!(matches!(result, Err(CoreError::Validation { field: "firmware", .. })));
}

#[tokio::test]
async fn firmware_upload_names_the_part_after_the_file() {
    let (server, ctrl) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/sys/ota"))
        .and(body_string_contains("filename=\"node-v5.bin\""))
        .and(body_string_contains("NODE-IMAGE-v5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "data": { "status": "ok", "message": "update staged" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("node-v5.bin");
    std::fs::write(&image, b"NODE-IMAGE-v5").unwrap();

    let ack = ctrl.upload_firmware(&image).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("update staged"));
}

#[tokio::test]
async fn missing_firmware_file_is_an_io_error() {
    let (_server, ctrl) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let result = ctrl.upload_firmware(&dir.path().join("absent.bin")).await;
    assert!(matches!(result, Err(CoreError::Io(_))));
}

#[tokio::test]
async fn login_token_is_attached_to_later_requests() {
    let (server, ctrl) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": "t-123", "expires_seconds": 3600 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sys/reboot"))
        .and(wiremock::matchers::header("authorization", "Bearer t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    ctrl.login(&SecretString::from("admin".to_string())).await.unwrap();
    assert!(ctrl.client().has_token());
    ctrl.reboot().await.unwrap();

    ctrl.logout().unwrap();
    assert!(!ctrl.client().has_token());
}
