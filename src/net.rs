//! Connectivity signal.
//!
//! The sync engine asks this before every mutating remote decision: online
//! means "attempt the remote call," offline means "queue it." Setting
//! `SPLITSHEET_OFFLINE` to a non-empty value forces the offline answer,
//! which is useful for tests and for working deliberately disconnected.

use async_trait::async_trait;
use std::time::Duration;

/// Environment variable that forces the offline answer when non-empty.
pub const OFFLINE_ENV: &str = "SPLITSHEET_OFFLINE";

const PROBE_URL: &str = "https://sheets.googleapis.com/$discovery/rest?version=v4";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A boolean online/offline signal.
#[async_trait]
pub trait Connectivity: Send {
    async fn is_online(&self) -> bool;
}

/// Probes the Sheets API host with a short-timeout HEAD request. Any
/// response, including an error status, proves the network path is up;
/// only a transport failure counts as offline.
pub struct Probe {
    client: reqwest::Client,
}

impl Probe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connectivity for Probe {
    async fn is_online(&self) -> bool {
        if forced_offline() {
            return false;
        }
        self.client.head(PROBE_URL).send().await.is_ok()
    }
}

/// Connectivity used in test mode: no probing, online unless the
/// environment forces offline.
pub struct EnvConnectivity;

#[async_trait]
impl Connectivity for EnvConnectivity {
    async fn is_online(&self) -> bool {
        !forced_offline()
    }
}

fn forced_offline() -> bool {
    std::env::var(OFFLINE_ENV).map(|v| !v.is_empty()).unwrap_or(false)
}
