//! End-to-end lookup tests against a mock tracking endpoint.

use serde_json::{json, Value};

mod common;

async fn seeded_relay(tracker: std::net::SocketAddr) -> common::RunningRelay {
    let relay = common::start_relay(common::config_for_tracker(tracker)).await;
    relay
        .state
        .lookup
        .resolver()
        .upsert("example.com", "CMP1")
        .unwrap();
    relay
}

async fn lookup(relay: &common::RunningRelay, body: Value) -> (u16, Value) {
    let res = common::client()
        .post(relay.url("/api/domains/test"))
        .json(&body)
        .send()
        .await
        .expect("relay unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_lookup_forwards_and_returns_click_id() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"abc123"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let res = common::client()
        .post(relay.url("/api/domains/test"))
        .header("User-Agent", "TestAgent/1.0")
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .json(&json!({ "domain": "Example.com/track", "query": "?utm_source=fb" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["domain"], "example.com");
    assert_eq!(body["data"]["rtkcid"], "abc123");
    assert_eq!(body["data"]["isSpy"], true);
    assert_eq!(body["data"]["past"], true);
    assert!(body["data"].get("trackingError").is_none());

    assert_eq!(tracker.request_count(), 1);
    let head = tracker.first_request();
    assert!(head.starts_with("get /cmp1?utm_source=fb&format=json http/1.1"), "{}", head);
    assert!(head.contains("user-agent: testagent/1.0"));
    assert!(head.contains("x-forwarded-for: 203.0.113.7\r\n"));
    assert!(head.contains("accept: application/json"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_default_user_agent_and_peer_address_forwarded() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"x"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let (status, _) = lookup(&relay, json!({ "domain": "example.com" })).await;
    assert_eq!(status, 200);

    let head = tracker.first_request();
    assert!(head.starts_with("get /cmp1?format=json http/1.1"), "{}", head);
    // reqwest sets no User-Agent of its own, so this one is ours.
    assert!(head.contains("user-agent: mozilla/5.0 (compatible; api-client/1.0)"));
    // The socket peer is still forwarded.
    assert!(head.contains("x-forwarded-for: 127.0.0.1"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_referrer_classification() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"x"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let cases = [
        (json!({ "domain": "example.com", "referrer": "https://google.com/" }), false),
        (json!({ "domain": "example.com", "referrer": "https://sub.adspy.com/x" }), true),
        (json!({ "domain": "example.com", "referrer": "https://facebook.com/ads/library/123" }), true),
        (json!({ "domain": "example.com", "referrer": "https://facebook.com/other" }), false),
        (json!({ "domain": "example.com", "referrer": "direct" }), true),
        (json!({ "domain": "example.com", "referrer": "not a url" }), false),
    ];
    for (body, expected) in cases {
        let (status, res) = lookup(&relay, body.clone()).await;
        assert_eq!(status, 200);
        assert_eq!(res["data"]["isSpy"], expected, "{}", body);
    }

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_referer_header_used_when_body_has_none() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"x"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let res: Value = common::client()
        .post(relay.url("/api/domains/test"))
        .header("Referer", "https://notaspy.com/page")
        .json(&json!({ "domain": "example.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(res["data"]["isSpy"], false);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_tracker_error_status_degrades_gracefully() {
    let tracker = common::start_mock_tracker(500, r#"{"error":"boom"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let (status, res) = lookup(
        &relay,
        json!({ "domain": "example.com", "referrer": "https://google.com/" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(res["data"]["domain"], "example.com");
    assert_eq!(res["data"]["rtkcid"], "");
    assert_eq!(res["data"]["isSpy"], false);
    assert!(res["data"]["trackingError"].as_str().unwrap().contains("500"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_tracker_body_degrades_gracefully() {
    let tracker = common::start_mock_tracker(200, "<html>not json</html>").await;
    let relay = seeded_relay(tracker.addr).await;

    let (status, res) = lookup(&relay, json!({ "domain": "example.com" })).await;
    assert_eq!(status, 200);
    assert_eq!(res["data"]["domain"], "example.com");
    assert_eq!(res["data"]["rtkcid"], "");
    assert!(res["data"]["trackingError"]
        .as_str()
        .unwrap()
        .contains("not valid JSON"));
    assert_eq!(tracker.request_count(), 1);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_tracker_degrades_gracefully() {
    let relay = seeded_relay(common::dead_address()).await;

    let (status, res) = lookup(&relay, json!({ "domain": "example.com/track" })).await;
    assert_eq!(status, 200);
    assert_eq!(res["data"]["domain"], "example.com");
    assert_eq!(res["data"]["rtkcid"], "");
    assert_eq!(res["data"]["isSpy"], true);
    assert!(res["data"]["trackingError"].is_string());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_click_id_is_not_an_error() {
    let tracker = common::start_mock_tracker(200, r#"{"status":"ok"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let (status, res) = lookup(&relay, json!({ "domain": "example.com" })).await;
    assert_eq!(status, 200);
    assert_eq!(res["data"]["rtkcid"], "");
    assert!(res["data"].get("trackingError").is_none());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_and_missing_domain_skip_tracking() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"x"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let (status, res) = lookup(&relay, json!({ "domain": "unknown.com/x" })).await;
    assert_eq!(status, 404);
    assert_eq!(res["error"], "Domain not found");
    assert_eq!(res["message"], "No campaign ID found for domain: unknown.com");

    let (status, res) = lookup(&relay, json!({ "referrer": "https://google.com" })).await;
    assert_eq!(status, 400);
    assert_eq!(res["error"], "Missing required field");

    assert_eq!(tracker.request_count(), 0);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_lookup_via_query_string() {
    let tracker = common::start_mock_tracker(200, r#"{"clickid":"q1"}"#).await;
    let relay = seeded_relay(tracker.addr).await;

    let res = common::client()
        .get(relay.url("/api/domains/test"))
        .query(&[
            ("domain", "example.com"),
            ("referrer", "https://facebook.com/ads/library/1"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["rtkcid"], "q1");
    assert_eq!(body["data"]["isSpy"], true);

    relay.shutdown.trigger();
}
