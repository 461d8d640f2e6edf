//! Durable local state: the expense cache, the two pending-operation queues,
//! and the recurring-rule set.
//!
//! Each piece of state is one JSON document in the data directory. Every
//! mutation is written to disk before the mutating call returns, so no
//! in-memory-only state is ever observable across a restart. Corrupt or
//! unreadable files degrade to "absent" with a warning; local corruption
//! must never crash the process.

use crate::model::{Expense, RecurringRule};
use crate::{utils, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const CACHE_JSON: &str = "cache.json";
const PENDING_ADDS_JSON: &str = "pending_adds.json";
const PENDING_DELETES_JSON: &str = "pending_deletes.json";
const RECURRING_JSON: &str = "recurring.json";

/// File-backed store for the cache, queues and rules. Owned by the sync
/// engine; nothing else mutates these files.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // ---- expense cache -------------------------------------------------

    /// Loads the last-known-good mirror of the remote ledger. `None` means
    /// no usable cache exists (never synced, cleared, or corrupt on disk),
    /// distinct from `Some(vec![])`, a valid snapshot of an empty ledger.
    pub async fn load_cache(&self) -> Option<Vec<Expense>> {
        self.load_optional(CACHE_JSON).await
    }

    pub async fn save_cache(&self, expenses: &[Expense]) -> Result<()> {
        self.save(CACHE_JSON, &expenses).await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        remove_if_exists(&self.path(CACHE_JSON)).await
    }

    // ---- pending-add queue ---------------------------------------------

    /// Appends to the pending-add queue. No deduplication: adding the same
    /// logical expense twice queues it twice.
    pub async fn enqueue_add(&self, expense: Expense) -> Result<()> {
        let mut queue = self.snapshot_adds().await;
        queue.push(expense);
        self.save(PENDING_ADDS_JSON, &queue).await
    }

    /// Takes the entire pending-add queue, leaving it empty on disk. Adds
    /// made after this call queue separately.
    pub async fn drain_adds(&self) -> Result<Vec<Expense>> {
        let queue = self.snapshot_adds().await;
        self.save(PENDING_ADDS_JSON, &Vec::<Expense>::new()).await?;
        Ok(queue)
    }

    /// Replaces the pending-add queue, preserving the given order.
    pub async fn replace_adds(&self, queue: Vec<Expense>) -> Result<()> {
        self.save(PENDING_ADDS_JSON, &queue).await
    }

    pub async fn snapshot_adds(&self) -> Vec<Expense> {
        self.load_or_empty(PENDING_ADDS_JSON).await
    }

    // ---- pending-delete queue ------------------------------------------

    /// Appends a remote position to the pending-delete queue. The position
    /// refers to the row as it existed at enqueue time.
    pub async fn enqueue_delete(&self, position: u32) -> Result<()> {
        let mut queue = self.snapshot_deletes().await;
        queue.push(position);
        self.save(PENDING_DELETES_JSON, &queue).await
    }

    pub async fn drain_deletes(&self) -> Result<Vec<u32>> {
        let queue = self.snapshot_deletes().await;
        self.save(PENDING_DELETES_JSON, &Vec::<u32>::new()).await?;
        Ok(queue)
    }

    pub async fn replace_deletes(&self, queue: Vec<u32>) -> Result<()> {
        self.save(PENDING_DELETES_JSON, &queue).await
    }

    pub async fn snapshot_deletes(&self) -> Vec<u32> {
        self.load_or_empty(PENDING_DELETES_JSON).await
    }

    // ---- recurring rules -----------------------------------------------

    pub async fn load_rules(&self) -> Vec<RecurringRule> {
        self.load_or_empty(RECURRING_JSON).await
    }

    pub async fn save_rules(&self, rules: &[RecurringRule]) -> Result<()> {
        self.save(RECURRING_JSON, &rules).await
    }

    // ---- plumbing ------------------------------------------------------

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    async fn load_optional<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.path(file);
        if !path.is_file() {
            return None;
        }
        match utils::deserialize::<T>(&path).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable state file {file}: {e:#}");
                None
            }
        }
    }

    async fn load_or_empty<T: DeserializeOwned>(&self, file: &str) -> Vec<T>
    where
        Vec<T>: DeserializeOwned,
    {
        self.load_optional(file).await.unwrap_or_default()
    }

    async fn save<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        utils::write(self.path(file), content).await
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Category};
    use tempfile::TempDir;

    fn expense(notes: &str) -> Expense {
        Expense {
            position: None,
            date: "3/2/2026".to_string(),
            amount: Amount::new(10.into()),
            payer: "Gigi".to_string(),
            category: Category::Other,
            notes: notes.to_string(),
        }
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_cache().await.is_none());

        store.save_cache(&[expense("one")]).await.unwrap();
        let cache = store.load_cache().await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].notes, "one");

        store.clear_cache().await.unwrap();
        assert!(store.load_cache().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_cache_is_not_absent() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.save_cache(&[]).await.unwrap();
        assert_eq!(store.load_cache().await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_add_queue_preserves_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.enqueue_add(expense("a")).await.unwrap();
        store.enqueue_add(expense("b")).await.unwrap();
        store.enqueue_add(expense("a")).await.unwrap();

        let drained = store.drain_adds().await.unwrap();
        let notes: Vec<&str> = drained.iter().map(|e| e.notes.as_str()).collect();
        assert_eq!(notes, ["a", "b", "a"]);
        assert!(store.snapshot_adds().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_queue_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.enqueue_delete(5).await.unwrap();
        store.enqueue_delete(2).await.unwrap();
        assert_eq!(store.snapshot_deletes().await, vec![5, 2]);
        assert_eq!(store.drain_deletes().await.unwrap(), vec![5, 2]);
        assert!(store.snapshot_deletes().await.is_empty());
    }

    #[tokio::test]
    async fn test_queues_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = Store::new(dir.path());
            store.enqueue_add(expense("persisted")).await.unwrap();
            store.enqueue_delete(7).await.unwrap();
        }
        let store = Store::new(dir.path());
        assert_eq!(store.snapshot_adds().await.len(), 1);
        assert_eq!(store.snapshot_deletes().await, vec![7]);
    }

    #[tokio::test]
    async fn test_corrupt_files_degrade_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        tokio::fs::write(dir.path().join(CACHE_JSON), "][")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join(PENDING_ADDS_JSON), "not json")
            .await
            .unwrap();
        assert!(store.load_cache().await.is_none());
        assert!(store.snapshot_adds().await.is_empty());
        // And the store keeps working afterwards.
        store.enqueue_add(expense("after")).await.unwrap();
        assert_eq!(store.snapshot_adds().await.len(), 1);
    }
}
