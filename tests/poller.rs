//! Integration tests for the long-running-operation poller using wiremock
//!
//! Each test drives a full begin -> poll -> final flow against a mocked ARM
//! endpoint and verifies call counts, pacing and terminal behavior.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aznet::arm::auth::StaticTokenCredential;
use aznet::resources::models::VirtualNetwork;
use aznet::{ArmClient, ArmConfig, Error, OperationStatus, PollUntilDoneOptions};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBSCRIPTION: &str = "12345678-1234-1234-1234-123456789abc";

fn test_client(server: &MockServer) -> ArmClient {
    let config = ArmConfig::new(SUBSCRIPTION).with_endpoint(server.uri());
    ArmClient::new(config, Arc::new(StaticTokenCredential::new("test-token")))
        .expect("client should build")
}

fn network_path(suffix: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/test-rg/providers/Microsoft.Network/{}",
        SUBSCRIPTION, suffix
    )
}

fn fast() -> PollUntilDoneOptions {
    PollUntilDoneOptions {
        frequency: Some(Duration::from_millis(10)),
        ..Default::default()
    }
}

/// One poll per non-terminal status, then the final resource (properties 1
/// and 2 of the poller contract).
#[tokio::test]
async fn test_async_operation_flow_polls_once_per_status() {
    let server = MockServer::start().await;
    let vnet_path = network_path("virtualNetworks/vnet-1");
    let operation_url = format!("{}/operations/op-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(&vnet_path))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("azure-asyncoperation", operation_url.as_str())
                .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // two in-progress polls, then terminal success
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;

    // the final GET for a PUT goes back to the resource URL
    Mock::given(method("GET"))
        .and(path(&vnet_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "vnet-1",
            "location": "westeurope",
            "properties": {"provisioningState": "Succeeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .virtual_networks()
        .begin_create_or_update("test-rg", "vnet-1", VirtualNetwork::default())
        .await
        .expect("begin should succeed");

    assert!(!poller.done());

    let vnet = poller
        .poll_until_done(fast())
        .await
        .expect("operation should succeed");
    assert_eq!(vnet.resource.name.as_deref(), Some("vnet-1"));
    assert!(poller.done());
    assert_eq!(poller.status(), OperationStatus::Succeeded);

    // terminal pollers never touch the network again; the mock expectations
    // verify the exact call counts on drop
    for _ in 0..3 {
        let status = poller.poll().await.expect("no-op poll should succeed");
        assert_eq!(status, OperationStatus::Succeeded);
    }
}

/// Cancellation during the inter-poll wait returns promptly with no
/// additional HTTP call (property 3).
#[tokio::test]
async fn test_cancellation_during_wait_stops_polling() {
    let server = MockServer::start().await;
    let lb_path = network_path("loadBalancers/lb-1");
    let operation_url = format!("{}/operations/del-1", server.uri());

    Mock::given(method("DELETE"))
        .and(path(&lb_path))
        .respond_with(
            ResponseTemplate::new(202).insert_header("location", operation_url.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    // still running, and the server asks for a long wait before the next poll
    Mock::given(method("GET"))
        .and(path("/operations/del-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("retry-after", "60"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .load_balancers()
        .begin_delete("test-rg", "lb-1")
        .await
        .expect("begin should succeed");

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = poller
        .poll_until_done(PollUntilDoneOptions {
            frequency: Some(Duration::from_millis(10)),
            cancel: Some(token),
        })
        .await
        .expect_err("cancellation should surface");

    assert!(matches!(err, Error::Canceled));
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "cancellation should not wait out the retry-after"
    );
    assert!(!poller.done());
}

/// A terminal Failed status carries the server error detail (property 4).
#[tokio::test]
async fn test_failed_operation_surfaces_error_detail() {
    let server = MockServer::start().await;
    let fw_path = network_path("azureFirewalls/fw-1");
    let operation_url = format!("{}/operations/fw-del", server.uri());

    Mock::given(method("DELETE"))
        .and(path(&fw_path))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("azure-asyncoperation", operation_url.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/fw-del"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "X", "message": "Y"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .azure_firewalls()
        .begin_delete("test-rg", "fw-1")
        .await
        .expect("begin should succeed");

    let err = poller
        .poll_until_done(fast())
        .await
        .expect_err("operation should fail");

    match err {
        Error::OperationFailed {
            status,
            code,
            message,
        } => {
            assert_eq!(status, OperationStatus::Failed);
            assert_eq!(code, "X");
            assert_eq!(message, "Y");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(poller.done());
}

/// A Retry-After on the triggering response delays the first poll
/// (property 5).
#[tokio::test]
async fn test_retry_after_paces_the_next_poll() {
    let server = MockServer::start().await;
    let rt_path = network_path("routeTables/rt-1");
    let operation_url = format!("{}/operations/rt-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(&rt_path))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("azure-asyncoperation", operation_url.as_str())
                .insert_header("retry-after", "1")
                .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(&rt_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "rt-1",
            "properties": {"provisioningState": "Succeeded"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .route_tables()
        .begin_create_or_update("test-rg", "rt-1", Default::default())
        .await
        .expect("begin should succeed");

    let started = Instant::now();
    poller
        .poll_until_done(fast())
        .await
        .expect("operation should succeed");
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "the poller must honor the server-requested delay"
    );
}

/// A canned Running/Running/Succeeded body-polling sequence yields a
/// resource structurally equal to the final payload (property 6).
#[tokio::test]
async fn test_body_polling_round_trip() {
    let server = MockServer::start().await;
    let vnet_path = network_path("virtualNetworks/vnet-2");

    let final_body = json!({
        "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/test-rg/providers/Microsoft.Network/virtualNetworks/vnet-2"),
        "name": "vnet-2",
        "type": "Microsoft.Network/virtualNetworks",
        "location": "westeurope",
        "properties": {
            "addressSpace": {"addressPrefixes": ["10.1.0.0/16"]},
            "provisioningState": "Succeeded"
        }
    });

    // no polling headers: a PUT falls back to polling the resource body
    Mock::given(method("PUT"))
        .and(path(&vnet_path))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(&vnet_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(&vnet_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(&final_body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .virtual_networks()
        .begin_create_or_update("test-rg", "vnet-2", VirtualNetwork::default())
        .await
        .expect("begin should succeed");

    let vnet = poller
        .poll_until_done(fast())
        .await
        .expect("operation should succeed");

    let expected: VirtualNetwork =
        serde_json::from_value(final_body).expect("fixture should decode");
    assert_eq!(vnet, expected);
}

/// DELETE pollers resolve to `()` even when the status document has a body.
#[tokio::test]
async fn test_delete_resolves_to_unit() {
    let server = MockServer::start().await;
    let rt_path = network_path("routeTables/rt-gone");
    let operation_url = format!("{}/operations/rt-gone", server.uri());

    Mock::given(method("DELETE"))
        .and(path(&rt_path))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("azure-asyncoperation", operation_url.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/rt-gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .route_tables()
        .begin_delete("test-rg", "rt-gone")
        .await
        .expect("begin should succeed");

    poller
        .poll_until_done(fast())
        .await
        .expect("delete should succeed");
    assert_eq!(poller.status(), OperationStatus::Succeeded);
}

/// An operation that completed synchronously needs no polling at all.
#[tokio::test]
async fn test_synchronous_put_completes_without_polling() {
    let server = MockServer::start().await;
    let subnet_path = network_path("virtualNetworks/vnet-1/subnets/default");

    Mock::given(method("PUT"))
        .and(path(&subnet_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "default",
            "properties": {"addressPrefix": "10.0.0.0/24", "provisioningState": "Succeeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut poller = client
        .subnets()
        .begin_create_or_update("test-rg", "vnet-1", "default", Default::default())
        .await
        .expect("begin should succeed");

    assert!(poller.done());
    let subnet = poller
        .poll_until_done(fast())
        .await
        .expect("operation should succeed");
    assert_eq!(subnet.name.as_deref(), Some("default"));
}
