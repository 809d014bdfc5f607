//! PostgreSQL implementation of the URL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, RedirectKind, UrlRecord};
use crate::domain::errors::StoreError;
use crate::domain::repositories::UrlStore;
use crate::utils::db_error::is_unique_violation_on_code;

const COLUMNS: &str = "id, code, long_url, redirect_kind, owner_id, one_shot, created_at, expires_at";

#[derive(Debug, sqlx::FromRow)]
struct UrlRow {
    id: i64,
    code: String,
    long_url: String,
    redirect_kind: String,
    owner_id: Option<i64>,
    one_shot: bool,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<UrlRow> for UrlRecord {
    type Error = StoreError;

    fn try_from(row: UrlRow) -> Result<Self, Self::Error> {
        let kind = row
            .redirect_kind
            .parse::<RedirectKind>()
            .map_err(StoreError::Backend)?;

        Ok(UrlRecord {
            id: row.id,
            code: row.code,
            long_url: row.long_url,
            kind,
            owner_id: row.owner_id,
            one_shot: row.one_shot,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// PostgreSQL store for short link records.
///
/// Code uniqueness is enforced by the `urls_code_key` constraint; violations
/// surface as [`StoreError::DuplicateCode`].
pub struct PgUrlStore {
    pool: Arc<PgPool>,
}

impl PgUrlStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl UrlStore for PgUrlStore {
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let sql = format!(
            "INSERT INTO urls (code, long_url, redirect_kind, owner_id, one_shot, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(&record.code)
            .bind(&record.long_url)
            .bind(record.kind.as_str())
            .bind(record.owner_id)
            .bind(record.one_shot)
            .bind(record.created_at)
            .bind(record.expires_at)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on_code(&e) {
                    StoreError::DuplicateCode(record.code.clone())
                } else {
                    backend(e)
                }
            })?;

        row.try_into()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM urls WHERE code = $1");

        sqlx::query_as::<_, UrlRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(backend)?
            .map(UrlRecord::try_from)
            .transpose()
    }

    async fn find_by_long_url(
        &self,
        long_url: &str,
        kind: RedirectKind,
        owner_id: Option<i64>,
    ) -> Result<Option<UrlRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM urls
             WHERE long_url = $1
               AND redirect_kind = $2
               AND owner_id IS NOT DISTINCT FROM $3
               AND NOT one_shot
             ORDER BY id DESC
             LIMIT 1"
        );

        sqlx::query_as::<_, UrlRow>(&sql)
            .bind(long_url)
            .bind(kind.as_str())
            .bind(owner_id)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(backend)?
            .map(UrlRecord::try_from)
            .transpose()
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<UrlRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM urls WHERE owner_id = $1 ORDER BY id DESC");

        sqlx::query_as::<_, UrlRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(backend)?
            .into_iter()
            .map(UrlRecord::try_from)
            .collect()
    }

    async fn update(&self, code: &str, record: &UrlRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE urls
             SET code = $2, long_url = $3, redirect_kind = $4, owner_id = $5,
                 one_shot = $6, expires_at = $7
             WHERE code = $1",
        )
        .bind(code)
        .bind(&record.code)
        .bind(&record.long_url)
        .bind(record.kind.as_str())
        .bind(record.owner_id)
        .bind(record.one_shot)
        .bind(record.expires_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation_on_code(&e) {
                StoreError::DuplicateCode(record.code.clone())
            } else {
                backend(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM urls WHERE code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map(|_| ())
            .map_err(backend)
    }
}
