mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{Value, json};
use shortlink::api::dto::shorten::LinkResponse;
use shortlink::api::dto::stats::StatsResponse;
use shortlink::prelude::*;

fn bearer(key: &str) -> String {
    format!("Bearer {key}")
}

async fn create_link(server: &axum_test::TestServer, key: &str, body: Value) -> LinkResponse {
    let response = server
        .post("/api/short")
        .add_header("Authorization", bearer(key))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<LinkResponse>()
}

async fn url_id(store: &MemoryUrlStore, code: &str) -> i64 {
    store.find_by_code(code).await.unwrap().unwrap().id
}

#[tokio::test]
async fn test_stats_count_redirects_with_client_metadata() {
    let ctx = common::create_unlimited_state();
    let store = ctx.store.clone();
    let clicks = ctx.clicks.clone();
    let clock = ctx.clock.clone();
    let server = common::test_server(ctx.state);

    let link = create_link(
        &server,
        common::PREMIUM_KEY,
        json!({ "url": "https://example.com/a" }),
    )
    .await;
    let id = url_id(&store, &link.code).await;

    server
        .get(&format!("/{}", link.code))
        .add_header("X-Forwarded-For", "203.0.113.7")
        .add_header("User-Agent", "Mozilla/5.0")
        .add_header("Referer", "https://news.example.org/")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    clock.advance(Duration::minutes(5));

    server
        .get(&format!("/{}", link.code))
        .add_header("X-Forwarded-For", "198.51.100.9")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    common::wait_for_clicks(&clicks, id, 2).await;

    let response = server
        .get(&format!("/api/stats/{}", link.code))
        .add_header("Authorization", bearer(common::PREMIUM_KEY))
        .await;

    response.assert_status_ok();
    let stats = response.json::<StatsResponse>();
    assert_eq!(stats.code, link.code);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.items.len(), 2);

    let newest = &stats.items[0];
    assert_eq!(newest.ip_address.as_deref(), Some("198.51.100.9"));
    assert_eq!(newest.accessed_at, common::epoch() + Duration::minutes(5));
    assert!(newest.user_agent.is_none());

    let oldest = &stats.items[1];
    assert_eq!(oldest.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(oldest.user_agent.as_deref(), Some("Mozilla/5.0"));
    assert_eq!(oldest.referrer.as_deref(), Some("https://news.example.org/"));
    assert_eq!(oldest.accessed_at, common::epoch());
}

#[tokio::test]
async fn test_stats_limit_caps_items_not_total() {
    let ctx = common::create_unlimited_state();
    let store = ctx.store.clone();
    let clicks = ctx.clicks.clone();
    let server = common::test_server(ctx.state);

    let link = create_link(
        &server,
        common::PREMIUM_KEY,
        json!({ "url": "https://example.com/a" }),
    )
    .await;
    let id = url_id(&store, &link.code).await;

    for _ in 0..3 {
        server
            .get(&format!("/{}", link.code))
            .await
            .assert_status(StatusCode::TEMPORARY_REDIRECT);
    }
    common::wait_for_clicks(&clicks, id, 3).await;

    let stats = server
        .get(&format!("/api/stats/{}", link.code))
        .add_query_param("limit", 1)
        .add_header("Authorization", bearer(common::PREMIUM_KEY))
        .await
        .json::<StatsResponse>();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.items.len(), 1);
}

#[tokio::test]
async fn test_stats_rejects_out_of_range_limit() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let link = create_link(
        &server,
        common::PREMIUM_KEY,
        json!({ "url": "https://example.com/a" }),
    )
    .await;

    server
        .get(&format!("/api/stats/{}", link.code))
        .add_query_param("limit", 5000)
        .add_header("Authorization", bearer(common::PREMIUM_KEY))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_stats_access_control() {
    let ctx = common::create_unlimited_state();
    let server = common::test_server(ctx.state);

    let premium = create_link(
        &server,
        common::PREMIUM_KEY,
        json!({ "url": "https://example.com/a" }),
    )
    .await;
    let free = create_link(
        &server,
        common::FREE_KEY,
        json!({ "url": "https://example.com/b" }),
    )
    .await;

    server
        .get(&format!("/api/stats/{}", premium.code))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get(&format!("/api/stats/{}", premium.code))
        .add_header("Authorization", bearer(common::OTHER_PREMIUM_KEY))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get(&format!("/api/stats/{}", free.code))
        .add_header("Authorization", bearer(common::FREE_KEY))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "forbidden");

    server
        .get("/api/stats/missing1")
        .add_header("Authorization", bearer(common::PREMIUM_KEY))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_one_shot_redirect_records_no_click() {
    let ctx = common::create_unlimited_state();
    let store = ctx.store.clone();
    let clicks = ctx.clicks.clone();
    let stats = ctx.state.stats_service.clone();
    let server = common::test_server(ctx.state);

    let link = create_link(
        &server,
        common::PREMIUM_KEY,
        json!({ "url": "https://example.com/once", "one_shot": true }),
    )
    .await;
    let id = url_id(&store, &link.code).await;

    server
        .get(&format!("/{}", link.code))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    stats.shutdown().await;
    assert_eq!(clicks.count_for_url(id).await.unwrap(), 0);
}
