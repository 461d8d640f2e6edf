//! The sync engine: optimistic local mutation, durable queuing, and
//! reconciliation against the remote ledger.
//!
//! The engine is the only component that mutates the expense cache and the
//! two pending-operation queues. Every mutating operation takes `&mut self`,
//! so within a process the exclusive borrow serializes them and two
//! operations can never interleave their writes. A host that needs to share
//! an engine across tasks wraps it in `tokio::sync::Mutex`, which serializes
//! whole operations the same way.
//!
//! The remote is authoritative whenever it is reachable: reconciliation
//! always ends in a full reload that overwrites the cache, never a per-row
//! merge.

mod status;

pub use status::{LogNotifier, Notifier, SyncStatus, Toast};

use crate::api::Ledger;
use crate::auth::Auth;
use crate::error::LedgerError;
use crate::model::{date, Expense, RecurringRule};
use crate::net::Connectivity;
use crate::store::Store;
use crate::Result;
use tracing::{debug, warn};

/// What happened to an `add_expense` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended to the remote and reloaded; the record has a real position.
    Synced,
    /// No connectivity; queued and visible locally as pending.
    SavedOffline,
    /// The remote append failed; queued and visible locally as pending.
    SavedLocally,
    /// The credential was rejected and the session was cleared.
    AuthExpired,
}

/// What happened to a `delete_expense` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted on the remote and reloaded.
    Deleted,
    /// Removed from the cache; queued for remote deletion if it had a
    /// confirmed position.
    DeletedLocally,
    /// The remote rejected the deletion; nothing changed locally.
    Failed,
    /// No expense matched the given position.
    NotFound,
    /// The credential was rejected and the session was cleared.
    AuthExpired,
}

/// Owns the expense cache, the pending queues and the sync status, and
/// orchestrates every interaction with the remote ledger. All collaborators
/// are injected, so the engine runs identically against Google Sheets or the
/// in-memory test ledger.
pub struct SyncEngine {
    store: Store,
    ledger: Box<dyn Ledger + Send>,
    connectivity: Box<dyn Connectivity + Send>,
    notifier: Box<dyn Notifier + Send>,
    auth: Auth,
    cache: Vec<Expense>,
    status: SyncStatus,
}

impl SyncEngine {
    /// Creates an engine, warming the in-memory cache from the durable one.
    pub async fn new(
        store: Store,
        ledger: Box<dyn Ledger + Send>,
        connectivity: Box<dyn Connectivity + Send>,
        notifier: Box<dyn Notifier + Send>,
        auth: Auth,
    ) -> Self {
        let cache = store.load_cache().await.unwrap_or_default();
        Self {
            store,
            ledger,
            connectivity,
            notifier,
            auth,
            cache,
            status: SyncStatus::Idle,
        }
    }

    /// The current cache contents, pending entries included.
    pub fn expenses(&self) -> &[Expense] {
        &self.cache
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Depths of the pending-add and pending-delete queues.
    pub async fn queue_depths(&self) -> (usize, usize) {
        (
            self.store.snapshot_adds().await.len(),
            self.store.snapshot_deletes().await.len(),
        )
    }

    pub async fn is_authorized(&self) -> bool {
        self.auth.is_authorized().await
    }

    pub async fn is_online(&self) -> bool {
        self.connectivity.is_online().await
    }

    fn set_status(&mut self, status: SyncStatus) {
        self.status = status;
        self.notifier.status(status);
    }

    /// Replaces the cache with the remote ledger's rows.
    ///
    /// On `Unauthorized` the session is cleared and the call ends there. On
    /// any other failure the durable cache is served instead (`offline`), or
    /// the status becomes `error` when no cache exists. One prior successful
    /// sync is all it takes to stay usable from a cold start.
    pub async fn load(&mut self) -> Result<()> {
        self.set_status(SyncStatus::Syncing);
        match self.ledger.read_all().await {
            Ok(expenses) => {
                self.cache = expenses;
                self.store.save_cache(&self.cache).await?;
                self.set_status(SyncStatus::Synced);
            }
            Err(LedgerError::Unauthorized) => self.force_sign_out().await?,
            Err(e) => {
                debug!("load failed, falling back to cache: {e}");
                match self.store.load_cache().await {
                    Some(cached) => {
                        self.cache = cached;
                        self.set_status(SyncStatus::Offline);
                        self.notifier.toast(Toast::Info, "Loaded cached data");
                    }
                    None => {
                        self.set_status(SyncStatus::Error);
                        self.notifier.toast(Toast::Error, "Failed to load expenses");
                    }
                }
            }
        }
        Ok(())
    }

    /// Adds an expense, optimistically and locally first: the record lands
    /// in the cache with the sentinel position before any remote attempt,
    /// so it is visible immediately regardless of outcome.
    pub async fn add_expense(&mut self, expense: Expense) -> Result<AddOutcome> {
        let pending = Expense {
            position: None,
            ..expense
        };
        self.cache.push(pending.clone());
        self.store.save_cache(&self.cache).await?;

        if !self.connectivity.is_online().await {
            self.store.enqueue_add(pending).await?;
            self.notifier
                .toast(Toast::Info, "Saved offline. Will sync when online.");
            return Ok(AddOutcome::SavedOffline);
        }

        match self.ledger.append(&pending).await {
            Ok(()) => {
                self.notifier.toast(Toast::Success, "Expense added");
                // The authoritative reload replaces the optimistic entry
                // with the confirmed row.
                self.load().await?;
                Ok(AddOutcome::Synced)
            }
            Err(LedgerError::Unauthorized) => {
                self.force_sign_out().await?;
                Ok(AddOutcome::AuthExpired)
            }
            Err(e) => {
                warn!("append failed, queuing instead: {e}");
                self.store.enqueue_add(pending).await?;
                self.notifier
                    .toast(Toast::Info, "Saved locally. Will sync later.");
                Ok(AddOutcome::SavedLocally)
            }
        }
    }

    /// Deletes the expense at `position`, or a pending (sentinel) entry when
    /// `position` is `None`. Pending entries are removed from the cache only
    /// and never reach the remote delete call.
    pub async fn delete_expense(&mut self, position: Option<u32>) -> Result<DeleteOutcome> {
        let exists = match position {
            Some(p) => self.cache.iter().any(|e| e.position == Some(p)),
            None => self.cache.iter().any(Expense::is_pending),
        };
        if !exists {
            self.notifier.toast(Toast::Error, "No such expense");
            return Ok(DeleteOutcome::NotFound);
        }

        let position = match position {
            None => {
                self.remove_cached(None).await?;
                self.notifier.toast(Toast::Info, "Deleted locally.");
                return Ok(DeleteOutcome::DeletedLocally);
            }
            Some(p) => p,
        };

        if !self.connectivity.is_online().await {
            return self.delete_locally(position).await;
        }

        match self.ledger.delete_at(position).await {
            Ok(()) => {
                self.notifier.toast(Toast::Success, "Expense deleted");
                self.load().await?;
                Ok(DeleteOutcome::Deleted)
            }
            Err(LedgerError::Unauthorized) => {
                self.force_sign_out().await?;
                Ok(DeleteOutcome::AuthExpired)
            }
            Err(LedgerError::Unreachable(e)) => {
                // A transport failure says nothing about the request; take
                // the offline branch, consistent with add_expense.
                warn!("delete unreachable, queuing instead: {e}");
                self.delete_locally(position).await
            }
            Err(e) => {
                // The remote refused the request; leave the cache unchanged
                // so the user can look and retry.
                warn!("delete rejected: {e}");
                self.notifier.toast(Toast::Error, "Failed to delete.");
                Ok(DeleteOutcome::Failed)
            }
        }
    }

    async fn delete_locally(&mut self, position: u32) -> Result<DeleteOutcome> {
        self.store.enqueue_delete(position).await?;
        self.remove_cached(Some(position)).await?;
        self.notifier.toast(Toast::Info, "Deleted locally.");
        Ok(DeleteOutcome::DeletedLocally)
    }

    async fn remove_cached(&mut self, position: Option<u32>) -> Result<()> {
        match position {
            Some(p) => self.cache.retain(|e| e.position != Some(p)),
            None => {
                if let Some(ix) = self.cache.iter().position(Expense::is_pending) {
                    self.cache.remove(ix);
                }
            }
        }
        self.store.save_cache(&self.cache).await
    }

    /// Drains both pending queues against the remote, then reloads.
    ///
    /// No-op unless online and authorized. Queued adds are applied in their
    /// original insertion order; failures stay queued for the next pass.
    /// Queued deletes are applied in strictly descending position order:
    /// removing a row shifts every row below it up by one, so descending
    /// order keeps every not-yet-processed position valid without
    /// re-querying between deletes. Returns the number of operations the
    /// remote acknowledged.
    pub async fn sync_offline_queue(&mut self) -> Result<usize> {
        let (adds_pending, deletes_pending) = self.queue_depths().await;
        if adds_pending == 0 && deletes_pending == 0 {
            return Ok(0);
        }
        if !self.connectivity.is_online().await || !self.auth.is_authorized().await {
            return Ok(0);
        }

        self.set_status(SyncStatus::Syncing);
        let mut synced = 0usize;

        // Swap out the whole add queue up front; adds made while this pass
        // runs queue separately instead of racing the drain.
        let adds = self.store.drain_adds().await?;
        let mut requeue_adds: Vec<Expense> = Vec::new();
        for (ix, expense) in adds.iter().enumerate() {
            match self.ledger.append(expense).await {
                Ok(()) => synced += 1,
                Err(LedgerError::Unauthorized) => {
                    // Put this and the rest back so re-authorizing resumes
                    // exactly here, then drop the session.
                    requeue_adds.extend_from_slice(&adds[ix..]);
                    self.store.replace_adds(requeue_adds).await?;
                    self.force_sign_out().await?;
                    return Ok(synced);
                }
                Err(e) => {
                    warn!("queued add failed, keeping it queued: {e}");
                    requeue_adds.push(expense.clone());
                }
            }
        }
        self.store.replace_adds(requeue_adds).await?;

        let mut deletes = self.store.drain_deletes().await?;
        deletes.sort_unstable_by(|a, b| b.cmp(a));
        let mut requeue_deletes: Vec<u32> = Vec::new();
        for (ix, &position) in deletes.iter().enumerate() {
            match self.ledger.delete_at(position).await {
                Ok(()) => synced += 1,
                Err(LedgerError::Unauthorized) => {
                    requeue_deletes.extend_from_slice(&deletes[ix..]);
                    self.store.replace_deletes(requeue_deletes).await?;
                    self.force_sign_out().await?;
                    return Ok(synced);
                }
                Err(LedgerError::Unreachable(e)) => {
                    // Positions below this one are untouched by the deletes
                    // that already ran, so the queued position stays valid.
                    warn!("queued delete at {position} unreachable, keeping it queued: {e}");
                    requeue_deletes.push(position);
                }
                Err(e) => {
                    warn!("queued delete at {position} rejected, dropping it: {e}");
                }
            }
        }
        self.store.replace_deletes(requeue_deletes).await?;

        // One authoritative reload regardless of individual outcomes.
        self.load().await?;
        if synced > 0 {
            self.notifier
                .toast(Toast::Success, &format!("Synced {synced} change(s)"));
        }
        Ok(synced)
    }

    /// Generates concrete expenses for every elapsed period of every
    /// unexpired recurring rule, routing each occurrence through the same
    /// connected/disconnected branch as `add_expense`. Terminates because
    /// `last_generated` strictly advances and the bound is today. The rule
    /// set is persisted once, after all rules are processed.
    pub async fn process_recurring(&mut self) -> Result<usize> {
        let mut rules = self.store.load_rules().await;
        if rules.is_empty() {
            return Ok(0);
        }
        let today = date::today();
        let online = self.connectivity.is_online().await && self.auth.is_authorized().await;
        let mut added = 0usize;
        let mut auth_expired = false;

        'rules: for rule in rules.iter_mut() {
            if rule.is_expired(today) {
                continue;
            }
            let mut next = rule.next_occurrence();
            while next <= today {
                let expense = Expense {
                    position: None,
                    date: date::to_sheet_date(next),
                    amount: rule.amount,
                    payer: rule.payer.clone(),
                    category: rule.category,
                    notes: rule.description.clone(),
                };
                if online {
                    match self.ledger.append(&expense).await {
                        Ok(()) => added += 1,
                        Err(LedgerError::Unauthorized) => {
                            auth_expired = true;
                            break 'rules;
                        }
                        Err(e) => {
                            warn!("failed to add recurring expense, will catch up next sweep: {e}");
                            continue 'rules;
                        }
                    }
                } else {
                    self.store.enqueue_add(expense).await?;
                    added += 1;
                }
                rule.last_generated = next;
                next = rule.next_occurrence();
            }
        }

        self.store.save_rules(&rules).await?;
        if auth_expired {
            self.force_sign_out().await?;
            return Ok(added);
        }
        if added > 0 {
            self.notifier
                .toast(Toast::Success, &format!("Added {added} recurring expense(s)"));
            if online {
                self.load().await?;
            }
        }
        Ok(added)
    }

    // ---- recurring-rule bookkeeping ------------------------------------

    pub async fn rules(&self) -> Vec<RecurringRule> {
        self.store.load_rules().await
    }

    /// Inserts the rule, or replaces the stored rule with the same id.
    pub async fn upsert_rule(&mut self, rule: RecurringRule) -> Result<()> {
        let mut rules = self.store.load_rules().await;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
        self.store.save_rules(&rules).await
    }

    /// Removes the rule with the given id. Returns whether one was removed.
    pub async fn remove_rule(&mut self, id: &str) -> Result<bool> {
        let mut rules = self.store.load_rules().await;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        let removed = rules.len() != before;
        if removed {
            self.store.save_rules(&rules).await?;
        }
        Ok(removed)
    }

    /// Clears the credential, the cache and the durable cache snapshot.
    /// Remote work stays queued; it resumes after re-authorization.
    async fn force_sign_out(&mut self) -> Result<()> {
        self.auth.sign_out().await?;
        self.cache.clear();
        self.store.clear_cache().await?;
        self.set_status(SyncStatus::Error);
        self.notifier
            .toast(Toast::Error, "Session expired. Please sign in again.");
        Ok(())
    }
}
