//! PostgreSQL implementation of the click store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, NewClick};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ClickStore;

const COLUMNS: &str = "id, url_id, ip, user_agent, referrer, accessed_at";

#[derive(Debug, sqlx::FromRow)]
struct ClickRow {
    id: i64,
    url_id: i64,
    ip: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    accessed_at: DateTime<Utc>,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        Click {
            id: row.id,
            url_id: row.url_id,
            ip: row.ip,
            user_agent: row.user_agent,
            referrer: row.referrer,
            accessed_at: row.accessed_at,
        }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// PostgreSQL store for redirect events in `url_clicks`.
///
/// Rows reference `urls(id)` with `ON DELETE CASCADE`, so deleting a link drops
/// its statistics.
pub struct PgClickStore {
    pool: Arc<PgPool>,
}

impl PgClickStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickStore for PgClickStore {
    async fn record(&self, click: NewClick) -> Result<Click, StoreError> {
        let sql = format!(
            "INSERT INTO url_clicks (url_id, ip, user_agent, referrer, accessed_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ClickRow>(&sql)
            .bind(click.url_id)
            .bind(&click.ip)
            .bind(&click.user_agent)
            .bind(&click.referrer)
            .bind(click.accessed_at)
            .fetch_one(self.pool.as_ref())
            .await
            .map(Click::from)
            .map_err(backend)
    }

    async fn count_for_url(&self, url_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM url_clicks WHERE url_id = $1")
            .bind(url_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(backend)
    }

    async fn list_for_url(&self, url_id: i64, limit: i64) -> Result<Vec<Click>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM url_clicks
             WHERE url_id = $1
             ORDER BY accessed_at DESC, id DESC
             LIMIT $2"
        );

        let rows = sqlx::query_as::<_, ClickRow>(&sql)
            .bind(url_id)
            .bind(limit.max(0))
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().map(Click::from).collect())
    }
}
