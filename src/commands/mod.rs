//! Command handlers for the splitsheet CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod expense;
mod init;
mod recurring;
mod report;
mod sync;

use crate::api::{self, Mode};
use crate::auth::Auth;
use crate::net::{Connectivity, EnvConnectivity, Probe};
use crate::store::Store;
use crate::sync::{LogNotifier, SyncEngine};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use auth::{auth_login, auth_signout, auth_status};
pub use expense::{add, delete, settle};
pub use init::init;
pub use recurring::{recurring_add, recurring_delete, recurring_list, recurring_run};
pub use report::{balance, list, report, status};
pub use sync::refresh;

/// The output type for a command: a message for the user and, optionally,
/// structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of
    /// the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists)
    /// as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

/// Builds a sync engine wired to the production collaborators for `config`.
/// Test mode skips the network probe so nothing leaves the process.
pub(crate) async fn engine(config: &Config, mode: Mode) -> Result<SyncEngine> {
    let auth = Auth::new(config.token_path());
    let ledger = api::ledger(config, auth.clone(), mode)?;
    let connectivity: Box<dyn Connectivity + Send> = match mode {
        Mode::Google => Box::new(Probe::new()),
        Mode::Test => Box::new(EnvConnectivity),
    };
    Ok(SyncEngine::new(
        Store::new(config.root()),
        ledger,
        connectivity,
        Box::new(LogNotifier),
        auth,
    )
    .await)
}
