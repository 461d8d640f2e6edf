//! The remote ledger gateway.
//!
//! The rest of the program talks to the sheet through the narrow `Ledger`
//! trait: read all rows, append a row, delete a row by position. The Google
//! implementation and an in-memory test implementation both satisfy it, and
//! `Mode::from_env` selects between them so the whole app can run
//! top-to-bottom without touching Google.

mod sheet;
mod test_ledger;

use crate::auth::Auth;
use crate::error::LedgerError;
use crate::model::Expense;
use crate::{Config, Result};

pub use test_ledger::{LedgerCall, TestLedger, TestLedgerState, SEED_DATA};

/// The three operations the remote ledger supports.
///
/// All three fail with `LedgerError::Unauthorized` when the bearer
/// credential is expired or revoked. That is the only error category the
/// sync engine treats specially.
#[async_trait::async_trait]
pub trait Ledger {
    /// Reads every data row. Row positions are derived from each record's
    /// offset in the returned sequence, starting just below the header.
    async fn read_all(&mut self) -> std::result::Result<Vec<Expense>, LedgerError>;

    /// Appends a row at the end of the ledger. The remote assigns the
    /// position implicitly and does not return it; a subsequent `read_all`
    /// is required to learn it.
    async fn append(&mut self, expense: &Expense) -> std::result::Result<(), LedgerError>;

    /// Deletes the row at the given 1-based position. Rows below it shift
    /// up by one.
    async fn delete_at(&mut self, position: u32) -> std::result::Result<(), LedgerError>;
}

/// Selects the `Ledger` implementation.
///
/// When `SPLITSHEET_IN_TEST_MODE` is set and non-empty the in-memory test
/// ledger is used, otherwise the Google Sheets implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Google,
    Test,
}

impl Mode {
    pub fn from_env() -> Mode {
        match std::env::var("SPLITSHEET_IN_TEST_MODE") {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Constructs the `Ledger` for the given mode.
pub fn ledger(config: &Config, auth: Auth, mode: Mode) -> Result<Box<dyn Ledger + Send>> {
    Ok(match mode {
        Mode::Google => Box::new(sheet::GoogleLedger::new(config.clone(), auth)),
        Mode::Test => {
            let ledger = TestLedger::new(config.spreadsheet_id());
            // The first use of a sheet id in test mode starts from seed data,
            // so the app has something to show without Google.
            let state = ledger.get_state();
            if state.rows.is_empty() && state.calls.is_empty() {
                ledger.seed_csv(SEED_DATA)?;
            }
            Box::new(ledger)
        }
    })
}
