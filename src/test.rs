//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::TestLedger;
use crate::auth::Auth;
use crate::net::Connectivity;
use crate::store::Store;
use crate::sync::{Notifier, SyncEngine, SyncStatus, Toast};
use crate::Config;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

/// Test environment: a temp data directory with a Config, a private test
/// ledger, a settable connectivity switch and a recording notifier. Holds
/// the TempDir to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
    online: Arc<AtomicBool>,
    toasts: Arc<Mutex<Vec<(Toast, String)>>>,
    statuses: Arc<Mutex<Vec<SyncStatus>>>,
}

impl TestEnv {
    /// Creates a test environment with a fresh home directory and a unique
    /// spreadsheet id, so each test gets its own test-ledger state.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("splitsheet");
        let rand = Uuid::new_v4().to_string().replace('-', "");
        let sheet_url = format!("https://docs.google.com/spreadsheets/d/{rand}/edit");
        let config = Config::create(
            &root,
            &sheet_url,
            "Expenses",
            ("Gigi".to_string(), "Luke".to_string()),
        )
        .await
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
            online: Arc::new(AtomicBool::new(true)),
            toasts: Arc::new(Mutex::new(Vec::new())),
            statuses: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    /// A handle to this environment's test ledger.
    pub(crate) fn ledger(&self) -> TestLedger {
        TestLedger::new(self.config.spreadsheet_id())
    }

    /// Seeds the test ledger with the standard six-row history.
    pub(crate) fn seed_default(&self) {
        self.ledger().seed_csv(crate::api::SEED_DATA).unwrap();
    }

    pub(crate) fn auth(&self) -> Auth {
        Auth::new(self.config.token_path())
    }

    /// Stores a valid bearer token.
    pub(crate) async fn sign_in(&self) {
        self.auth().save_token("test-token", 3600).await.unwrap();
    }

    pub(crate) fn store(&self) -> Store {
        Store::new(self.config.root())
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Builds a sync engine wired to this environment's collaborators.
    pub(crate) async fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.store(),
            Box::new(self.ledger()),
            Box::new(StubConnectivity(self.online.clone())),
            Box::new(RecordingNotifier {
                toasts: self.toasts.clone(),
                statuses: self.statuses.clone(),
            }),
            self.auth(),
        )
        .await
    }

    /// Every toast message recorded so far, in order.
    pub(crate) fn toast_messages(&self) -> Vec<String> {
        self.toasts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Every status transition recorded so far, in order.
    pub(crate) fn statuses(&self) -> Vec<SyncStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

/// Connectivity stub backed by a shared flag the test can flip.
struct StubConnectivity(Arc<AtomicBool>);

#[async_trait]
impl Connectivity for StubConnectivity {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Notifier that records everything for later assertions.
struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<(Toast, String)>>>,
    statuses: Arc<Mutex<Vec<SyncStatus>>>,
}

impl Notifier for RecordingNotifier {
    fn status(&mut self, status: SyncStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn toast(&mut self, kind: Toast, message: &str) {
        self.toasts.lock().unwrap().push((kind, message.to_string()));
    }
}
