//! Short link allocation, resolution and owner management.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::clock::Clock;
use crate::domain::entities::{Caller, NewUrlRecord, RedirectKind, Tier, UrlPatch, UrlRecord};
use crate::domain::errors::{CoreError, CoreResult, StoreError};
use crate::domain::expiry_policy::ExpiryPolicy;
use crate::domain::repositories::UrlStore;
use crate::utils::code_generator::{
    CodeGenerator, CodeInput, CodePolicy, CodeStrategy, is_reserved_code,
};
use crate::utils::url_normalizer::normalize_url;

/// Default budget of insert attempts for generated codes.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Tunables for [`LinkService`].
#[derive(Debug, Clone)]
pub struct AllocationSettings {
    pub strategy: CodeStrategy,
    pub code_policy: CodePolicy,
    pub expiry: ExpiryPolicy,
    pub max_attempts: usize,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            strategy: CodeStrategy::Random,
            code_policy: CodePolicy::default(),
            expiry: ExpiryPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// A request to shorten a URL.
#[derive(Debug, Clone, Default)]
pub struct AllocationRequest {
    pub long_url: String,
    /// Caller-chosen code. Empty or absent means generate one.
    pub custom_code: Option<String>,
    pub kind: RedirectKind,
    pub caller: Caller,
    pub one_shot: bool,
    /// Skip the reuse lookup and always create a new mapping.
    pub force_new: bool,
}

/// Where a short code points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Id of the resolved record, for click attribution.
    pub url_id: i64,
    pub target: String,
    pub kind: RedirectKind,
    /// The mapping was consumed by this resolution.
    pub one_shot: bool,
    pub resolved_at: DateTime<Utc>,
}

/// Result of a single insert attempt.
#[derive(Debug)]
enum InsertOutcome {
    Committed(UrlRecord),
    Duplicate(String),
    Fatal(StoreError),
}

/// Service for allocating and resolving short links.
///
/// Uniqueness is delegated to the store: every candidate is inserted directly and a
/// [`StoreError::DuplicateCode`] is the only signal that triggers another attempt.
/// There is no check-then-insert window for concurrent writers to race through.
pub struct LinkService<S: UrlStore + ?Sized> {
    store: Arc<S>,
    generator: Arc<dyn CodeGenerator>,
    code_policy: CodePolicy,
    expiry: ExpiryPolicy,
    max_attempts: usize,
    clock: Arc<dyn Clock>,
}

impl<S: UrlStore + ?Sized> LinkService<S> {
    /// Creates a new link service.
    pub fn new(store: Arc<S>, settings: AllocationSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            generator: settings.strategy.generator(),
            code_policy: settings.code_policy,
            expiry: settings.expiry,
            max_attempts: settings.max_attempts.max(1),
            clock,
        }
    }

    /// Replaces the code generator selected by the settings.
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a short link, or returns the caller's existing equivalent one.
    ///
    /// # Reuse
    ///
    /// Without a custom code, `force_new` or `one_shot`, a live record with the same
    /// normalized URL, redirect kind and owner is returned with its expiry refreshed
    /// from now.
    ///
    /// # Collisions
    ///
    /// A custom code gets one insert. If its occupant has expired, the occupant is
    /// purged and the insert is tried once more. Generated codes are regenerated
    /// with a fresh salt up to the configured attempt budget.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidUrl`] / [`CoreError::InvalidCode`] on bad input
    /// - [`CoreError::DuplicateCode`] if a custom code is held by a live record
    /// - [`CoreError::AllocationExhausted`] if every generated candidate collided
    /// - [`CoreError::Store`] on any other store failure, without retrying
    pub async fn allocate(&self, request: AllocationRequest) -> CoreResult<UrlRecord> {
        let long_url =
            normalize_url(&request.long_url).map_err(|e| CoreError::InvalidUrl(e.to_string()))?;
        let tier = request.caller.tier();
        let owner_id = request.caller.account_id();

        let custom_code = request
            .custom_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        if let Some(code) = custom_code {
            self.code_policy.validate_custom_code(code, tier)?;
        }

        let now = self.clock.now();

        if custom_code.is_none()
            && !request.force_new
            && !request.one_shot
            && let Some(reused) = self
                .reuse(&long_url, request.kind, owner_id, tier, now)
                .await?
        {
            metrics::counter!("shortlink_allocations_total", "outcome" => "reused").increment(1);
            return Ok(reused);
        }

        let template = NewUrlRecord {
            code: String::new(),
            long_url,
            kind: request.kind,
            owner_id,
            one_shot: request.one_shot,
            created_at: now,
            expires_at: self.expiry.compute_expiry(tier, now),
        };

        let record = match custom_code {
            Some(code) => {
                self.insert_custom(NewUrlRecord {
                    code: code.to_string(),
                    ..template
                })
                .await?
            }
            None => self.insert_generated(template, tier).await?,
        };

        metrics::counter!("shortlink_allocations_total", "outcome" => "created").increment(1);
        info!(
            code = %record.code,
            tier = %tier,
            owner_id = ?record.owner_id,
            one_shot = record.one_shot,
            "Short link allocated"
        );

        Ok(record)
    }

    /// Returns the live record for the reuse key with a refreshed expiry, if any.
    async fn reuse(
        &self,
        long_url: &str,
        kind: RedirectKind,
        owner_id: Option<i64>,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<UrlRecord>> {
        let Some(mut existing) = self
            .store
            .find_by_long_url(long_url, kind, owner_id)
            .await?
        else {
            return Ok(None);
        };

        if existing.is_expired_at(now) {
            return Ok(None);
        }

        existing.expires_at = later_expiry(
            existing.expires_at,
            self.expiry.compute_expiry(tier, now),
        );

        match self.store.update(&existing.code, &existing).await {
            Ok(()) => {
                debug!(code = %existing.code, "Reused existing short link");
                Ok(Some(existing))
            }
            // Deleted between lookup and refresh.
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn try_insert(&self, record: NewUrlRecord) -> InsertOutcome {
        match self.store.insert(record).await {
            Ok(stored) => InsertOutcome::Committed(stored),
            Err(StoreError::DuplicateCode(code)) => InsertOutcome::Duplicate(code),
            Err(e) => InsertOutcome::Fatal(e),
        }
    }

    async fn insert_custom(&self, candidate: NewUrlRecord) -> CoreResult<UrlRecord> {
        let code = match self.try_insert(candidate.clone()).await {
            InsertOutcome::Committed(record) => return Ok(record),
            InsertOutcome::Fatal(e) => return Err(e.into()),
            InsertOutcome::Duplicate(code) => code,
        };

        metrics::counter!("shortlink_code_collisions_total", "source" => "custom").increment(1);

        if !self.purge_expired(&code).await? {
            return Err(CoreError::DuplicateCode(code));
        }

        debug!(code = %code, "Custom code reclaimed from expired record");

        match self.try_insert(candidate).await {
            InsertOutcome::Committed(record) => Ok(record),
            InsertOutcome::Duplicate(code) => Err(CoreError::DuplicateCode(code)),
            InsertOutcome::Fatal(e) => Err(e.into()),
        }
    }

    async fn insert_generated(&self, template: NewUrlRecord, tier: Tier) -> CoreResult<UrlRecord> {
        let length = self.code_policy.length_for(tier);

        for attempt in 0..self.max_attempts {
            let input = CodeInput {
                long_url: &template.long_url,
                length,
                salt: (attempt > 0).then(|| self.salt(attempt)),
            };
            let code = self.generator.generate(&input);

            if is_reserved_code(&code) {
                continue;
            }

            let candidate = NewUrlRecord {
                code,
                ..template.clone()
            };

            match self.try_insert(candidate).await {
                InsertOutcome::Committed(record) => return Ok(record),
                InsertOutcome::Fatal(e) => return Err(e.into()),
                InsertOutcome::Duplicate(code) => {
                    metrics::counter!("shortlink_code_collisions_total", "source" => "generated")
                        .increment(1);
                    debug!(code = %code, attempt = attempt + 1, "Generated code collided");
                }
            }
        }

        warn!(
            attempts = self.max_attempts,
            length, "Short code allocation exhausted its retry budget"
        );
        Err(CoreError::AllocationExhausted(self.max_attempts))
    }

    fn salt(&self, attempt: usize) -> u64 {
        let nanos = self.clock.now().timestamp_nanos_opt().unwrap_or_default() as u64;
        nanos.wrapping_add(attempt as u64)
    }

    /// Looks up where `code` points.
    ///
    /// A one-shot mapping is deleted by the resolution that returns it; only the
    /// caller whose delete removed the record receives the target. Expired records
    /// are left in place for the caller to [`purge`](Self::purge_expired).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordNotFound`] or [`CoreError::Expired`].
    pub async fn resolve(&self, code: &str) -> CoreResult<Resolution> {
        let record = self
            .store
            .find_by_code(code)
            .await?
            .ok_or(CoreError::RecordNotFound)?;

        let now = self.clock.now();
        if record.is_expired_at(now) {
            return Err(CoreError::Expired);
        }

        if record.one_shot {
            if !self.store.delete(code).await? {
                return Err(CoreError::RecordNotFound);
            }
            info!(code = %code, "One-shot link consumed");
        }

        Ok(Resolution {
            url_id: record.id,
            target: record.long_url,
            kind: record.kind,
            one_shot: record.one_shot,
            resolved_at: now,
        })
    }

    /// Deletes the record at `code` if it has expired.
    ///
    /// Returns true if a record was removed.
    pub async fn purge_expired(&self, code: &str) -> CoreResult<bool> {
        let Some(record) = self.store.find_by_code(code).await? else {
            return Ok(false);
        };

        if !record.is_expired_at(self.clock.now()) {
            return Ok(false);
        }

        let removed = self.store.delete(code).await?;
        if removed {
            debug!(code = %code, "Purged expired short link");
        }
        Ok(removed)
    }

    /// Returns every mapping owned by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Forbidden`] for anonymous callers.
    pub async fn list(&self, caller: &Caller) -> CoreResult<Vec<UrlRecord>> {
        let owner_id = caller
            .account_id()
            .ok_or_else(|| CoreError::Forbidden("listing links requires an account".to_string()))?;

        Ok(self.store.list_by_owner(owner_id).await?)
    }

    /// Applies an owner edit to the mapping at `code`.
    ///
    /// Only premium owners may edit. A new target is normalized, a new code is
    /// validated like a custom code. The expiry is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`CoreError::RecordNotFound`] if there is no mapping at `code`
    /// - [`CoreError::Forbidden`] if the caller is not a premium owner
    /// - [`CoreError::DuplicateCode`] if the new code is taken
    pub async fn edit(&self, code: &str, caller: &Caller, patch: UrlPatch) -> CoreResult<UrlRecord> {
        let mut record = self.owned_record(code, caller).await?;

        if let Some(long_url) = patch.long_url {
            record.long_url =
                normalize_url(&long_url).map_err(|e| CoreError::InvalidUrl(e.to_string()))?;
        }

        if let Some(new_code) = patch.code.as_deref().map(str::trim)
            && new_code != record.code
        {
            self.code_policy
                .validate_custom_code(new_code, caller.tier())?;
            record.code = new_code.to_string();
        }

        if let Some(kind) = patch.kind {
            record.kind = kind;
        }

        match self.store.update(code, &record).await {
            Ok(()) => {}
            Err(StoreError::DuplicateCode(taken)) => {
                if !self.purge_expired(&taken).await? {
                    return Err(CoreError::DuplicateCode(taken));
                }
                debug!(code = %taken, "Edited code reclaimed from expired record");
                self.store
                    .update(code, &record)
                    .await
                    .map_err(update_error)?;
            }
            Err(e) => return Err(update_error(e)),
        }

        info!(old_code = %code, code = %record.code, "Short link edited");
        Ok(record)
    }

    /// Deletes the mapping at `code` on behalf of its premium owner.
    pub async fn delete(&self, code: &str, caller: &Caller) -> CoreResult<()> {
        self.owned_record(code, caller).await?;

        if !self.store.delete(code).await? {
            return Err(CoreError::RecordNotFound);
        }

        info!(code = %code, "Short link deleted");
        Ok(())
    }

    /// Returns the mapping at `code` to its owner, whatever the tier.
    ///
    /// Expired mappings that have not been purged yet are still returned.
    ///
    /// # Errors
    ///
    /// - [`CoreError::RecordNotFound`] if there is no mapping at `code`
    /// - [`CoreError::Forbidden`] if the caller does not own it
    pub async fn get(&self, code: &str, caller: &Caller) -> CoreResult<UrlRecord> {
        let record = self
            .store
            .find_by_code(code)
            .await?
            .ok_or(CoreError::RecordNotFound)?;

        let is_owner = caller
            .account_id()
            .is_some_and(|id| record.is_owned_by(id));
        if !is_owner {
            return Err(CoreError::Forbidden(
                "only the owner can manage this link".to_string(),
            ));
        }

        Ok(record)
    }

    /// Like [`get`](Self::get), but the owner must also be premium.
    pub async fn owned_record(&self, code: &str, caller: &Caller) -> CoreResult<UrlRecord> {
        let record = self.get(code, caller).await?;

        if caller.tier() != Tier::Premium {
            return Err(CoreError::Forbidden(
                "managing links requires a premium account".to_string(),
            ));
        }

        Ok(record)
    }

    /// Constructs the public short URL for `code`.
    pub fn short_url(&self, base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }
}

fn update_error(e: StoreError) -> CoreError {
    match e {
        StoreError::DuplicateCode(code) => CoreError::DuplicateCode(code),
        StoreError::NotFound => CoreError::RecordNotFound,
        other => CoreError::Store(other),
    }
}

/// The later of two expiries, where `None` means never.
fn later_expiry(
    current: Option<DateTime<Utc>>,
    refreshed: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (current, refreshed) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}
