//! PostgreSQL store tests. `#[sqlx::test]` creates a fresh database per test from
//! `DATABASE_URL` and applies `./migrations`.

use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use shortlink::domain::entities::{NewClick, NewUrlRecord, RedirectKind};
use shortlink::domain::errors::StoreError;
use shortlink::domain::repositories::{ClickStore, UrlStore};
use shortlink::infrastructure::persistence::{PgClickStore, PgUrlStore};

fn new_record(code: &str, url: &str, owner_id: Option<i64>) -> NewUrlRecord {
    NewUrlRecord {
        code: code.to_string(),
        long_url: url.to_string(),
        kind: RedirectKind::Temporary,
        owner_id,
        one_shot: false,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        expires_at: None,
    }
}

fn store(pool: &PgPool) -> PgUrlStore {
    PgUrlStore::new(Arc::new(pool.clone()))
}

#[sqlx::test]
async fn test_insert_and_find_by_code(pool: PgPool) {
    let store = store(&pool);

    let mut record = new_record("abc123", "https://example.com/a", Some(2));
    record.kind = RedirectKind::Permanent;
    record.expires_at = Some(record.created_at + Duration::days(90));

    let inserted = store.insert(record.clone()).await.unwrap();
    let found = store.find_by_code("abc123").await.unwrap().unwrap();

    assert!(inserted.id > 0);
    assert_eq!(found, inserted);
    assert_eq!(found.kind, RedirectKind::Permanent);
    assert_eq!(found.expires_at, record.expires_at);
    assert!(store.find_by_code("nope1234").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_duplicate_insert_is_reported_as_duplicate_code(pool: PgPool) {
    let store = store(&pool);
    store
        .insert(new_record("same", "https://example.com/a", None))
        .await
        .unwrap();

    let result = store
        .insert(new_record("same", "https://example.com/b", None))
        .await;

    assert!(matches!(result, Err(StoreError::DuplicateCode(code)) if code == "same"));
}

#[sqlx::test]
async fn test_find_by_long_url_matches_null_owner(pool: PgPool) {
    let store = store(&pool);
    store
        .insert(new_record("anon1", "https://example.com/a", None))
        .await
        .unwrap();
    store
        .insert(new_record("own1", "https://example.com/a", Some(2)))
        .await
        .unwrap();

    let anonymous = store
        .find_by_long_url("https://example.com/a", RedirectKind::Temporary, None)
        .await
        .unwrap();
    let owned = store
        .find_by_long_url("https://example.com/a", RedirectKind::Temporary, Some(2))
        .await
        .unwrap();
    let other_kind = store
        .find_by_long_url("https://example.com/a", RedirectKind::Permanent, None)
        .await
        .unwrap();

    assert_eq!(anonymous.unwrap().code, "anon1");
    assert_eq!(owned.unwrap().code, "own1");
    assert!(other_kind.is_none());
}

#[sqlx::test]
async fn test_find_by_long_url_skips_one_shot(pool: PgPool) {
    let store = store(&pool);
    let mut record = new_record("once", "https://example.com/a", None);
    record.one_shot = true;
    store.insert(record).await.unwrap();

    let found = store
        .find_by_long_url("https://example.com/a", RedirectKind::Temporary, None)
        .await
        .unwrap();

    assert!(found.is_none());
}

#[sqlx::test]
async fn test_list_by_owner_newest_first(pool: PgPool) {
    let store = store(&pool);
    store.insert(new_record("one1", "https://1.com/", Some(3))).await.unwrap();
    store.insert(new_record("two2", "https://2.com/", Some(3))).await.unwrap();
    store.insert(new_record("xxxx", "https://3.com/", Some(4))).await.unwrap();

    let codes: Vec<_> = store
        .list_by_owner(3)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.code)
        .collect();

    assert_eq!(codes, vec!["two2", "one1"]);
}

#[sqlx::test]
async fn test_update_moves_code(pool: PgPool) {
    let store = store(&pool);
    let mut record = store
        .insert(new_record("old1", "https://example.com/a", Some(2)))
        .await
        .unwrap();

    record.code = "new1".to_string();
    record.long_url = "https://example.com/b".to_string();
    store.update("old1", &record).await.unwrap();

    assert!(store.find_by_code("old1").await.unwrap().is_none());
    let moved = store.find_by_code("new1").await.unwrap().unwrap();
    assert_eq!(moved.id, record.id);
    assert_eq!(moved.long_url, "https://example.com/b");
}

#[sqlx::test]
async fn test_update_to_taken_code_is_duplicate(pool: PgPool) {
    let store = store(&pool);
    store
        .insert(new_record("keep", "https://example.com/a", Some(2)))
        .await
        .unwrap();
    let mut record = store
        .insert(new_record("move", "https://example.com/b", Some(2)))
        .await
        .unwrap();

    record.code = "keep".to_string();
    let result = store.update("move", &record).await;

    assert!(matches!(result, Err(StoreError::DuplicateCode(code)) if code == "keep"));
    assert!(store.find_by_code("move").await.unwrap().is_some());
}

#[sqlx::test]
async fn test_update_missing_code_is_not_found(pool: PgPool) {
    let store = store(&pool);
    let record = new_record("ghost", "https://example.com/a", None).into_record(99);

    let result = store.update("ghost", &record).await;

    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[sqlx::test]
async fn test_delete_reports_only_first_removal(pool: PgPool) {
    let store = store(&pool);
    store
        .insert(new_record("gone", "https://example.com/a", None))
        .await
        .unwrap();

    assert!(store.delete("gone").await.unwrap());
    assert!(!store.delete("gone").await.unwrap());
}

#[sqlx::test]
async fn test_ping(pool: PgPool) {
    assert!(store(&pool).ping().await.is_ok());
}

#[sqlx::test]
async fn test_clicks_follow_their_record(pool: PgPool) {
    let urls = store(&pool);
    let clicks = PgClickStore::new(Arc::new(pool.clone()));

    let record = urls
        .insert(new_record("clk1", "https://example.com/a", Some(2)))
        .await
        .unwrap();

    let at = record.created_at;
    for minute in 0..3 {
        clicks
            .record(NewClick {
                url_id: record.id,
                ip: Some("203.0.113.7".to_string()),
                user_agent: Some("Mozilla/5.0".to_string()),
                referrer: None,
                accessed_at: at + Duration::minutes(minute),
            })
            .await
            .unwrap();
    }

    assert_eq!(clicks.count_for_url(record.id).await.unwrap(), 3);

    let latest = clicks.list_for_url(record.id, 2).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].accessed_at, at + Duration::minutes(2));
    assert_eq!(latest[0].ip.as_deref(), Some("203.0.113.7"));

    urls.delete("clk1").await.unwrap();
    assert_eq!(clicks.count_for_url(record.id).await.unwrap(), 0);
}

#[sqlx::test]
async fn test_click_for_missing_record_fails(pool: PgPool) {
    let clicks = PgClickStore::new(Arc::new(pool));

    let result = clicks
        .record(NewClick {
            url_id: 424242,
            ip: None,
            user_agent: None,
            referrer: None,
            accessed_at: Utc::now(),
        })
        .await;

    assert!(matches!(result, Err(StoreError::Backend(_))));
}
