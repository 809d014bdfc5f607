//! In-process implementation of the click store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{Click, NewClick};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ClickStore;

/// Click store keyed by URL record id.
///
/// Clicks are appended in arrival order per record. Nothing removes them when
/// the record is deleted, but record ids are never reused so they stay unreachable.
#[derive(Debug)]
pub struct MemoryClickStore {
    clicks: DashMap<i64, Vec<Click>>,
    next_id: AtomicI64,
}

impl MemoryClickStore {
    pub fn new() -> Self {
        Self {
            clicks: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryClickStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClickStore for MemoryClickStore {
    async fn record(&self, click: NewClick) -> Result<Click, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = click.into_click(id);
        self.clicks
            .entry(stored.url_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn count_for_url(&self, url_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .clicks
            .get(&url_id)
            .map_or(0, |clicks| clicks.len() as i64))
    }

    async fn list_for_url(&self, url_id: i64, limit: i64) -> Result<Vec<Click>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .clicks
            .get(&url_id)
            .map(|clicks| clicks.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
