#![allow(clippy::unwrap_used)]
// Integration tests for `BatteryClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sonnenbat_api::{BatteryClient, Error, FailureKind, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BatteryClient, Url) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = BatteryClient::new(&TransportConfig::default()).unwrap();
    (server, client, base)
}

fn token(value: &str) -> SecretString {
    value.to_string().into()
}

// ── v2 endpoints ────────────────────────────────────────────────────

#[tokio::test]
async fn test_latest_data_sends_auth_token() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/latestdata"))
        .and(header("Auth-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Consumption_W": 750.5,
            "FullChargeCapacity": 5000,
            "GridFeedIn_W": -250.0,
            "Pac_total_W": 100.0,
            "Production_W": 500.0,
            "RSOC": 85,
            "USOC": 83,
            "Timestamp": "2025-11-29 21:00:00",
            "ic_status": {
                "statebms": "ready",
                "statecorecontrolmodule": "ongrid",
                "stateinverter": "running",
                "nrbatterymodules": 2
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client
        .latest_data(&base, Some(&token("test-token")))
        .await
        .unwrap();

    assert_eq!(data.rsoc, Some(85.0));
    assert_eq!(data.usoc, Some(83.0));
    assert_eq!(data.consumption_w, Some(750.5));
    assert_eq!(
        data.ic_status.unwrap().state_inverter.as_deref(),
        Some("running")
    );
}

#[tokio::test]
async fn test_status_decodes_flags_and_electrical_values() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BatteryCharging": false,
            "BatteryDischarging": true,
            "SystemStatus": "OnGrid",
            "Uac": 230.0,
            "Ubat": 50.0,
            "Fac": 50.0
        })))
        .mount(&server)
        .await;

    let status = client.status(&base, Some(&token("t"))).await.unwrap();

    assert_eq!(status.battery_discharging, Some(true));
    assert_eq!(status.system_status.as_deref(), Some("OnGrid"));
    assert_eq!(status.ubat, Some(50.0));
}

#[tokio::test]
async fn test_missing_token_sends_no_header() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/latestdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RSOC": 50 })))
        .mount(&server)
        .await;

    let data = client.latest_data(&base, None).await.unwrap();
    assert_eq!(data.rsoc, Some(50.0));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("auth-token"));
}

// ── proxy endpoints ─────────────────────────────────────────────────

#[tokio::test]
async fn test_proxy_endpoints() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "10.0.0.100",
            "wanIp": "31.31.31.31",
            "model": "eco 8.0",
            "mac": "AA:BB:CC:DD:EE:FF",
            "softwareVersion": "1.8.3",
            "hardwareVersion": "1.0",
            "led": "green"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/consumption"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "current_mw": 1_500_000 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "grid_feed_in_mw": 500_000,
            "production_mw": 3_000_000,
            "charge_level": 85,
            "charge_mode": "charging"
        })))
        .mount(&server)
        .await;

    let system = client.proxy_system(&base).await.unwrap();
    let consumption = client.proxy_consumption(&base).await.unwrap();
    let status = client.proxy_status(&base).await.unwrap();

    assert_eq!(system.wan_ip.as_deref(), Some("31.31.31.31"));
    assert_eq!(system.software_version.as_deref(), Some("1.8.3"));
    assert_eq!(consumption.current_mw, Some(1_500_000.0));
    assert_eq!(status.charge_mode.as_deref(), Some("charging"));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .latest_data(&base, Some(&token("wrong")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Auth);
    match err {
        Error::Authentication { status, .. } => assert_eq!(status, 401),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_auth() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.status(&base, None).await.unwrap_err();
    assert!(err.is_auth(), "expected auth failure, got: {err:?}");
}

#[tokio::test]
async fn test_server_error_carries_status_code() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.latest_data(&base, None).await.unwrap_err();

    match err {
        Error::UnexpectedStatus { status, ref url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/api/v2/latestdata"), "url was {url}");
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/latestdata"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let err = client.latest_data(&base, None).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Decode);
    match err {
        Error::Deserialization { url, message } => {
            assert!(url.contains("/api/v2/latestdata"));
            assert!(message.contains("not json at all"), "message was {message}");
        }
        other => panic!("expected Deserialization, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_shape_is_decode_error() {
    let (server, client, base) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RSOC": "eight" })))
        .mount(&server)
        .await;

    let err = client.latest_data(&base, None).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(100));
    let client = BatteryClient::new(&transport).unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.status(&base, None).await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_millis(100)),
        "expected Timeout, got: {err:?}"
    );
    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(err.to_string().ends_with("timed out after 100ms"), "{err}");
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    let client = BatteryClient::new(&TransportConfig::default()).unwrap();

    let err = client.latest_data(&base, None).await.unwrap_err();
    assert!(
        matches!(err, Error::Connection { .. }),
        "expected Connection, got: {err:?}"
    );
    assert_eq!(err.kind(), FailureKind::Network);
}
