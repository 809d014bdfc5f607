//! In-process implementation of the URL store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{NewUrlRecord, RedirectKind, UrlRecord};
use crate::domain::errors::StoreError;
use crate::domain::repositories::UrlStore;

/// URL store backed by a [`DashMap`] keyed by short code.
///
/// Insertion goes through the entry API, which holds the shard lock for the
/// code while checking and writing. That gives the same "exactly one winner"
/// guarantee as a database unique constraint.
///
/// A code change touches two keys, so it takes `moves` exclusively while every
/// other write holds it shared. No insert, delete or second rename can observe
/// the record under both codes or under neither.
///
/// Used when no database is configured and in tests.
#[derive(Debug)]
pub struct MemoryUrlStore {
    records: DashMap<String, UrlRecord>,
    next_id: AtomicI64,
    moves: RwLock<()>,
}

impl MemoryUrlStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
            moves: RwLock::new(()),
        }
    }

    fn shared(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.moves
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn exclusive(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.moves
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryUrlStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlStore for MemoryUrlStore {
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let _guard = self.shared()?;
        match self.records.entry(record.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCode(record.code)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let stored = record.into_record(id);
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self.records.get(code).map(|r| r.value().clone()))
    }

    async fn find_by_long_url(
        &self,
        long_url: &str,
        kind: RedirectKind,
        owner_id: Option<i64>,
    ) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                !r.one_shot && r.long_url == long_url && r.kind == kind && r.owner_id == owner_id
            })
            .max_by_key(|r| r.id)
            .map(|r| r.value().clone()))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<UrlRecord>, StoreError> {
        let mut records: Vec<UrlRecord> = self
            .records
            .iter()
            .filter(|r| r.owner_id == Some(owner_id))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    async fn update(&self, code: &str, record: &UrlRecord) -> Result<(), StoreError> {
        if record.code == code {
            let _guard = self.shared()?;
            let mut stored = self.records.get_mut(code).ok_or(StoreError::NotFound)?;
            *stored = record.clone();
            return Ok(());
        }

        let _guard = self.exclusive()?;

        if !self.records.contains_key(code) {
            return Err(StoreError::NotFound);
        }
        if self.records.contains_key(&record.code) {
            return Err(StoreError::DuplicateCode(record.code.clone()));
        }

        self.records.remove(code);
        self.records.insert(record.code.clone(), record.clone());

        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let _guard = self.shared()?;
        Ok(self.records.remove(code).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
