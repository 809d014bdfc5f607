mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{Value, json};
use shortlink::api::dto::shorten::LinkResponse;
use shortlink::prelude::*;

async fn shorten(server: &axum_test::TestServer, body: Value) -> LinkResponse {
    let response = server
        .post("/api/short")
        .add_header("Authorization", format!("Bearer {}", common::PREMIUM_KEY))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<LinkResponse>()
}

#[tokio::test]
async fn test_redirect_temporary() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let link = shorten(&server, json!({ "url": "https://example.com/target" })).await;

    let response = server.get(&format!("/{}", link.code)).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/target");
    assert!(!response.headers().contains_key("cache-control"));
}

#[tokio::test]
async fn test_redirect_permanent() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let link = shorten(
        &server,
        json!({ "url": "https://example.com/target", "redirect": "permanent" }),
    )
    .await;

    let response = server.get(&format!("/{}", link.code)).await;

    response.assert_status(StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let response = server.get("/nope1234").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_expired_is_gone_then_purged() {
    let ctx = common::create_unlimited_state();
    let clock = ctx.clock.clone();
    let store = ctx.store.clone();
    let server = common::test_server(ctx.state);

    let link = server
        .post("/api/short")
        .json(&json!({ "url": "https://example.com/target" }))
        .await
        .json::<LinkResponse>();

    clock.advance(Duration::hours(13));

    let response = server.get(&format!("/{}", link.code)).await;
    response.assert_status(StatusCode::GONE);
    assert_eq!(response.json::<Value>()["error"]["code"], "gone");
    assert!(store.is_empty());

    server
        .get(&format!("/{}", link.code))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_one_shot() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let link = shorten(
        &server,
        json!({ "url": "https://example.com/secret", "one_shot": true }),
    )
    .await;
    assert!(link.one_shot);

    let first = server.get(&format!("/{}", link.code)).await;
    first.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(first.header("cache-control"), "no-store");

    server
        .get(&format!("/{}", link.code))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_burst_limit_per_ip() {
    let ctx = common::create_test_state(RedirectLimit::default(), AllocationQuota::default());
    let clock = ctx.clock.clone();
    let server = common::test_server(ctx.state);

    let link = shorten(&server, json!({ "url": "https://example.com/target" })).await;
    let path = format!("/{}", link.code);

    for _ in 0..4 {
        server
            .get(&path)
            .add_header("X-Forwarded-For", "203.0.113.7")
            .await
            .assert_status(StatusCode::TEMPORARY_REDIRECT);
    }

    let limited = server
        .get(&path)
        .add_header("X-Forwarded-For", "203.0.113.7")
        .await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json::<Value>()["error"]["details"]["limit"], "redirect");

    server
        .get(&path)
        .add_header("X-Forwarded-For", "203.0.113.8")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    clock.advance(Duration::seconds(1));

    server
        .get(&path)
        .add_header("X-Forwarded-For", "203.0.113.7")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_redirect_limit_disabled() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let link = shorten(&server, json!({ "url": "https://example.com/target" })).await;

    for _ in 0..20 {
        server
            .get(&format!("/{}", link.code))
            .await
            .assert_status(StatusCode::TEMPORARY_REDIRECT);
    }
}
