#![allow(clippy::unwrap_used)]
// End-to-end tests: the Viessmann adapter against a wiremock API, driving
// a bridge that writes to a JSON state file.

use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vicare_api::Endpoints;
use vicare_core::{
    Bridge, BridgeConfig, BridgeState, ChannelKey, ChannelRegistry, ChannelStatus, Credentials,
    HeatingProfile, InitError, JsonFileStore, SensorStore, TickOutcome, ViessmannApi,
};

const FEATURES: &str = "/iot/v1/features/installations/4711/gateways/7571381681/devices/0/features";

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    config: BridgeConfig,
    dir: tempfile::TempDir,
}

async fn setup() -> Harness {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let mut config = BridgeConfig::new(Credentials::new(
        "user@example.com",
        SecretString::from("hunter2".to_string()),
        "client-123",
    ));
    config.token_path = dir.path().join("token.save");
    config.endpoints = Endpoints {
        iam: Url::parse(&format!("{base}/idp/v3/")).unwrap(),
        api: Url::parse(&format!("{base}/iot/v1/")).unwrap(),
    };

    Mock::given(method("POST"))
        .and(path("/idp/v3/authorize"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "vicare://oauth-callback/everest?code=auth-code"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/idp/v3/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Harness {
        server,
        config,
        dir,
    }
}

async fn mount_devices(server: &MockServer, heating_roles: Option<&[&str]>) {
    let mut devices = vec![json!({
        "id": "gateway",
        "modelId": "Heatbox1",
        "status": "Online",
        "deviceType": "vitoconnect",
        "roles": ["type:gateway"]
    })];
    if let Some(roles) = heating_roles {
        devices.push(json!({
            "id": "0",
            "modelId": "E3_Vitodens_100_0421",
            "status": "Online",
            "deviceType": "heating",
            "roles": roles
        }));
    }
    Mock::given(method("GET"))
        .and(path("/iot/v1/equipment/installations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 4711,
                "gateways": [{ "serial": "7571381681", "devices": devices }]
            }]
        })))
        .mount(server)
        .await;
}

async fn mount_feature(server: &MockServer, name: &str, properties: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{FEATURES}/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "feature": name, "isEnabled": true, "properties": properties }
        })))
        .mount(server)
        .await;
}

fn sensor(value: f64, status: &str) -> Value {
    json!({
        "status": { "type": "string", "value": status },
        "value": { "type": "number", "value": value, "unit": "celsius" }
    })
}

fn store(h: &Harness) -> JsonFileStore {
    JsonFileStore::open(h.dir.path().join("state.json")).unwrap()
}

fn status(outcome: &TickOutcome, key: u8) -> ChannelStatus {
    let TickOutcome::Completed(report) = outcome else {
        panic!("expected a completed cycle, got {outcome:?}");
    };
    report.outcome(ChannelKey::new(key)).unwrap().status.clone()
}

fn updated(value: &str) -> ChannelStatus {
    ChannelStatus::Updated {
        value: value.into(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_boiler_cycle_writes_state_file() {
    let h = setup().await;
    mount_devices(&h.server, Some(&["type:boiler"])).await;
    mount_feature(&h.server, "heating.sensors.temperature.outside", sensor(7.5, "connected")).await;
    mount_feature(
        &h.server,
        "heating.circuits.0.sensors.temperature.room",
        sensor(0.0, "notConnected"),
    )
    .await;
    mount_feature(
        &h.server,
        "heating.dhw.temperature.main",
        json!({ "value": { "type": "number", "value": 50 } }),
    )
    .await;
    mount_feature(
        &h.server,
        "heating.circuits.0.operating.programs.active",
        json!({ "value": { "type": "string", "value": "normal" } }),
    )
    .await;
    mount_feature(
        &h.server,
        "heating.circuits.0.operating.programs.normal",
        json!({
            "active": { "type": "boolean", "value": true },
            "temperature": { "type": "number", "value": 20 }
        }),
    )
    .await;
    mount_feature(&h.server, "heating.boiler.sensors.temperature.main", sensor(55.5, "connected")).await;
    mount_feature(
        &h.server,
        "heating.burners.0",
        json!({ "active": { "type": "boolean", "value": true } }),
    )
    .await;

    let api = ViessmannApi::new(&h.config);
    let bridge = Bridge::start(&api, &h.config, ChannelRegistry::standard(), store(&h)).await;
    assert_eq!(bridge.state(), BridgeState::Enabled);
    assert_eq!(bridge.session().unwrap().appliance().profile(), HeatingProfile::Boiler);

    let outcome = bridge.tick().await;

    assert_eq!(status(&outcome, 1), updated("7.5"));
    assert_eq!(status(&outcome, 2), ChannelStatus::Skipped);
    assert_eq!(status(&outcome, 3), ChannelStatus::Skipped);
    assert_eq!(status(&outcome, 4), updated("50.0"));
    assert_eq!(status(&outcome, 5), ChannelStatus::Skipped);
    assert_eq!(status(&outcome, 6), updated("20.0"));
    assert_eq!(status(&outcome, 7), updated("55.5"));
    assert_eq!(status(&outcome, 8), updated("On"));
    assert_eq!(status(&outcome, 9), updated("normal"));

    // All nine channels were registered and the values persisted.
    let reopened = store(&h);
    let sensors = reopened.sensors().unwrap();
    assert_eq!(sensors.len(), 9);
    assert_eq!(sensors[7].value.as_deref(), Some("On"));
    assert!(sensors[1].value.is_none());
}

#[tokio::test]
async fn test_heat_pump_in_standby() {
    let h = setup().await;
    mount_devices(&h.server, Some(&["type:heatpump"])).await;
    mount_feature(
        &h.server,
        "heating.circuits.0.operating.programs.active",
        json!({ "value": { "type": "string", "value": "standby" } }),
    )
    .await;
    mount_feature(
        &h.server,
        "heating.compressors.0",
        json!({ "active": { "type": "boolean", "value": false } }),
    )
    .await;
    mount_feature(&h.server, "heating.boiler.sensors.temperature.main", sensor(60.0, "connected")).await;

    let api = ViessmannApi::new(&h.config);
    let bridge = Bridge::start(&api, &h.config, ChannelRegistry::standard(), store(&h)).await;
    let outcome = bridge.tick().await;

    assert_eq!(status(&outcome, 6), ChannelStatus::Skipped);
    // Heat pumps never report a boiler temperature, even if the API has one.
    assert_eq!(status(&outcome, 7), ChannelStatus::Skipped);
    assert_eq!(status(&outcome, 8), updated("Off"));
    assert_eq!(status(&outcome, 9), updated("standby"));
}

#[tokio::test]
async fn test_server_error_aborts_cycle() {
    let h = setup().await;
    mount_devices(&h.server, Some(&["type:boiler"])).await;
    mount_feature(&h.server, "heating.sensors.temperature.outside", sensor(7.5, "connected")).await;
    Mock::given(method("GET"))
        .and(path(format!("{FEATURES}/heating.circuits.0.sensors.temperature.room")))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "errorType": "DEVICE_COMMUNICATION_ERROR",
            "message": "gateway offline"
        })))
        .mount(&h.server)
        .await;

    let api = ViessmannApi::new(&h.config);
    let bridge = Bridge::start(&api, &h.config, ChannelRegistry::standard(), store(&h)).await;
    let outcome = bridge.tick().await;

    assert!(matches!(outcome, TickOutcome::Aborted(_)), "got {outcome:?}");
    let sensors = store(&h).sensors().unwrap();
    assert!(sensors.iter().all(|s| s.value.is_none()));
}

#[tokio::test]
async fn test_account_without_heating_device() {
    let h = setup().await;
    mount_devices(&h.server, None).await;

    let api = ViessmannApi::new(&h.config);
    let state = store(&h);
    let bridge = Bridge::start(&api, &h.config, ChannelRegistry::standard(), state).await;

    assert_eq!(bridge.state(), BridgeState::Disabled);
    assert!(matches!(bridge.failure(), Some(InitError::NoAppliance)));
    assert!(bridge.store().existing_keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_login_disables_bridge() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let mut config = BridgeConfig::new(Credentials::new(
        "user@example.com",
        SecretString::from("wrong".to_string()),
        "client-123",
    ));
    config.token_path = dir.path().join("token.save");
    config.endpoints = Endpoints {
        iam: Url::parse(&format!("{base}/idp/v3/")).unwrap(),
        api: Url::parse(&format!("{base}/iot/v1/")).unwrap(),
    };
    Mock::given(method("POST"))
        .and(path("/idp/v3/authorize"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = ViessmannApi::new(&config);
    let state = JsonFileStore::open(dir.path().join("state.json")).unwrap();
    let bridge = Bridge::start(&api, &config, ChannelRegistry::standard(), state).await;

    assert!(matches!(bridge.failure(), Some(InitError::ConnectFailed { .. })));
    assert!(matches!(bridge.tick().await, TickOutcome::Disabled));
}
