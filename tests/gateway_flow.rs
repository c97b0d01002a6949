//! End-to-end behaviour over real loopback sockets.

mod common;

use std::time::{Duration, Instant};

use common::{
    config_for, mint_token, spawn_gateway, start_mock_upstream, unused_addr, SECRET,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_public_read_passes_through() {
    let identity = start_mock_upstream(200, "{}").await;
    let content = start_mock_upstream(200, r#"{"id":5,"title":"hello"}"#).await;
    let commentary = start_mock_upstream(200, "[]").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&identity.url(), &content.url(), &commentary.url())).await;

    let res = reqwest::get(format!("http://{addr}/posts/5?expand=author"))
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let headers = res.headers().clone();
    assert_eq!(headers["x-proxied-by"], "api-gateway");
    assert!(headers["x-request-id"].to_str().unwrap().starts_with("req_"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["x-powered-by"], "API-Gateway");
    assert_eq!(res.text().await.unwrap(), r#"{"id":5,"title":"hello"}"#);

    let hits = content.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uri, "/posts/5?expand=author");
    assert_eq!(hits[0].headers["x-forwarded-by"], "api-gateway");
    assert_eq!(hits[0].headers["x-request-id"], headers["x-request-id"]);
    assert_eq!(hits[0].headers["host"], content.addr.to_string().as_str());

    shutdown.trigger();
}

#[tokio::test]
async fn test_caller_request_id_is_kept_end_to_end() {
    let content = start_mock_upstream(200, "[]").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&content.url(), &content.url(), &content.url())).await;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/comments"))
        .header("x-request-id", "trace-77")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-77");
    assert_eq!(content.hits()[0].headers["x-request-id"], "trace-77");

    shutdown.trigger();
}

#[tokio::test]
async fn test_expired_token_on_protected_route_never_reaches_upstream() {
    let content = start_mock_upstream(201, "{}").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&content.url(), &content.url(), &content.url())).await;

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/posts"))
        .bearer_auth(mint_token(SECRET, -60))
        .json(&json!({ "title": "late" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": false, "message": "Token expired" }));
    assert_eq!(content.hit_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_token_on_protected_route() {
    let commentary = start_mock_upstream(201, "{}").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&commentary.url(), &commentary.url(), &commentary.url())).await;

    let res = reqwest::Client::new()
        .delete(format!("http://{addr}/comments/3"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access token is required");
    assert_eq!(commentary.hit_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_token_reaches_upstream_with_body() {
    let content = start_mock_upstream(201, r#"{"id":9}"#).await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&content.url(), &content.url(), &content.url())).await;
    let token = mint_token(SECRET, 3600);

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/posts"))
        .bearer_auth(&token)
        .json(&json!({ "title": "fresh" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let hits = content.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].method, "POST");
    assert_eq!(hits[0].body, r#"{"title":"fresh"}"#);
    assert_eq!(
        hits[0].headers["authorization"].to_str().unwrap(),
        format!("Bearer {token}")
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_identity_routes_are_not_gated() {
    let identity = start_mock_upstream(200, r#"{"ok":true}"#).await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&identity.url(), &identity.url(), &identity.url())).await;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/auth/profile"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(identity.hits()[0].uri, "/auth/profile");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_route_gets_not_found_envelope() {
    let upstream = start_mock_upstream(200, "{}").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&upstream.url(), &upstream.url(), &upstream.url())).await;

    for path in ["/unknown", "/postsx", "/"] {
        let res = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(res.status(), 404, "path {path}");
        assert_eq!(res.headers()["x-powered-by"], "API-Gateway");
        let body: Value = res.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Route not found",
                "availableRoutes": ["/auth/*", "/posts/*", "/comments/*"],
            })
        );
    }
    assert_eq!(upstream.hit_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_options_answered_without_upstream() {
    let upstream = start_mock_upstream(200, "{}").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&upstream.url(), &upstream.url(), &upstream.url())).await;

    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/posts/1"))
        .header("origin", "https://app.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example.com"
    );
    assert!(res.text().await.unwrap().is_empty());
    assert_eq!(upstream.hit_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_is_not_retried() {
    let content = start_mock_upstream(500, r#"{"error":"boom"}"#).await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&content.url(), &content.url(), &content.url())).await;

    let res = reqwest::get(format!("http://{addr}/posts")).await.unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["x-proxied-by"], "api-gateway");
    assert_eq!(res.text().await.unwrap(), r#"{"error":"boom"}"#);
    assert_eq!(content.hit_count(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_exhausts_ladder_then_503() {
    let identity = start_mock_upstream(200, "{}").await;
    let dead = unused_addr().await;
    let mut config = config_for(&identity.url(), &identity.url(), &format!("http://{dead}"));
    config.retries.base_delay_ms = 50;
    let (addr, shutdown) = spawn_gateway(config).await;

    let started = Instant::now();
    let res = reqwest::Client::new()
        .get(format!("http://{addr}/comments/post/5"))
        .header("x-request-id", "req_dead_1")
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(res.status(), 503);
    assert_eq!(res.headers()["x-request-id"], "req_dead_1");
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "Service temporarily unavailable",
            "requestId": "req_dead_1",
            "error": "SERVICE_UNAVAILABLE",
        })
    );
    // 50 + 100 + 150 ms of backoff
    assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let upstream = start_mock_upstream(200, "{}").await;
    let (addr, shutdown) =
        spawn_gateway(config_for(&upstream.url(), &upstream.url(), &upstream.url())).await;

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = reqwest::Client::new()
        .get(format!("http://{addr}/posts"))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(result.is_err());
}
