//! Implements the `Ledger` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of the app so
//! that the whole thing can run, top-to-bottom, without Google Sheets (set
//! `SPLITSHEET_IN_TEST_MODE`). State lives in a process-wide registry keyed
//! by spreadsheet id, so tests can construct a second handle to the same
//! ledger and inspect what the engine did to it.

use crate::api::Ledger;
use crate::error::LedgerError;
use crate::model::{Expense, FIRST_DATA_ROW};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, OnceLock};

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<Mutex<TestLedgerState>>>>> = OnceLock::new();

/// A recorded remote call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    ReadAll,
    Append(Vec<String>),
    DeleteAt(u32),
}

/// The mutable state behind a `TestLedger`.
#[derive(Debug, Clone, Default)]
pub struct TestLedgerState {
    /// Data rows; the row at index `i` has position `i + 2`.
    pub rows: Vec<Vec<String>>,
    /// Every call made against this ledger.
    pub calls: Vec<LedgerCall>,
    /// When set, every call fails with `Unauthorized`.
    pub unauthorized: bool,
    /// When set, every call fails with `Unreachable`.
    pub unreachable: bool,
    /// Fail the next N `append` calls with `Remote`.
    pub fail_appends: usize,
    /// Fail the next N `delete_at` calls with `Remote`.
    pub fail_deletes: usize,
    /// Fail the next N `delete_at` calls with `Unreachable`.
    pub unreachable_deletes: usize,
}

/// An in-memory ledger that records calls and supports failure injection.
pub struct TestLedger {
    state: Arc<Mutex<TestLedgerState>>,
}

impl TestLedger {
    /// Creates a handle to the ledger registered under `key`, creating an
    /// empty one on first use. Handles with the same key share state.
    pub fn new(key: &str) -> Self {
        let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
        let mut registry = registry.lock().expect("test ledger registry poisoned");
        let state = registry
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TestLedgerState::default())))
            .clone();
        Self { state }
    }

    pub fn get_state(&self) -> TestLedgerState {
        self.state.lock().expect("test ledger state poisoned").clone()
    }

    pub fn set_state(&self, state: TestLedgerState) {
        *self.state.lock().expect("test ledger state poisoned") = state;
    }

    /// Replaces the rows with data parsed from a headerless CSV string.
    pub fn seed_csv(&self, csv_data: &str) -> crate::Result<()> {
        let rows = load_csv(csv_data)?;
        let mut state = self.state.lock().expect("test ledger state poisoned");
        state.rows = rows;
        Ok(())
    }

}

#[async_trait::async_trait]
impl Ledger for TestLedger {
    async fn read_all(&mut self) -> Result<Vec<Expense>, LedgerError> {
        let mut state = self.state.lock().expect("test ledger state poisoned");
        state.calls.push(LedgerCall::ReadAll);
        check_blanket_failures(&state)?;
        Ok(state
            .rows
            .iter()
            .enumerate()
            .map(|(ix, row)| Expense::from_row(ix as u32 + FIRST_DATA_ROW, row))
            .collect())
    }

    async fn append(&mut self, expense: &Expense) -> Result<(), LedgerError> {
        let row = expense.to_row();
        let mut state = self.state.lock().expect("test ledger state poisoned");
        state.calls.push(LedgerCall::Append(row.clone()));
        check_blanket_failures(&state)?;
        if state.fail_appends > 0 {
            state.fail_appends -= 1;
            return Err(LedgerError::Remote("injected append failure".to_string()));
        }
        state.rows.push(row);
        Ok(())
    }

    async fn delete_at(&mut self, position: u32) -> Result<(), LedgerError> {
        let mut state = self.state.lock().expect("test ledger state poisoned");
        state.calls.push(LedgerCall::DeleteAt(position));
        check_blanket_failures(&state)?;
        if state.unreachable_deletes > 0 {
            state.unreachable_deletes -= 1;
            return Err(LedgerError::Unreachable(
                "injected delete failure".to_string(),
            ));
        }
        if state.fail_deletes > 0 {
            state.fail_deletes -= 1;
            return Err(LedgerError::Remote("injected delete failure".to_string()));
        }
        let ix = position
            .checked_sub(FIRST_DATA_ROW)
            .map(|ix| ix as usize)
            .filter(|&ix| ix < state.rows.len())
            .ok_or_else(|| LedgerError::Remote(format!("position {position} out of range")))?;
        state.rows.remove(ix);
        Ok(())
    }
}

fn check_blanket_failures(state: &TestLedgerState) -> Result<(), LedgerError> {
    if state.unauthorized {
        return Err(LedgerError::Unauthorized);
    }
    if state.unreachable {
        return Err(LedgerError::Unreachable("injected".to_string()));
    }
    Ok(())
}

/// Loads rows from a CSV-formatted string.
fn load_csv(csv_data: &str) -> crate::Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed data: a small ledger with a little history and one settlement.
pub const SEED_DATA: &str = r#"1/5/2026,120.00,Luke,Utilities,Electric bill
1/12/2026,84.50,Gigi,Grocery/Toiletry,Weekly groceries
1/20/2026,45.00,Luke,House Items,Shower caddy
2/2/2026,60.25,Gigi,Grocery/Toiletry,Groceries
2/9/2026,20.12,Gigi,Settlement,Settled via app
2/15/2026,33.40,Luke,Other,Takeout
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fresh() -> TestLedger {
        TestLedger::new(&Uuid::new_v4().to_string())
    }

    #[tokio::test]
    async fn test_seed_and_read() {
        let mut ledger = fresh();
        ledger.seed_csv(SEED_DATA).unwrap();
        let expenses = ledger.read_all().await.unwrap();
        assert_eq!(expenses.len(), 6);
        assert_eq!(expenses[0].position, Some(2));
        assert_eq!(expenses[5].position, Some(7));
        assert_eq!(expenses[0].payer, "Luke");
        assert_eq!(expenses[0].amount.to_string(), "120.00");
    }

    #[tokio::test]
    async fn test_append_then_read_assigns_next_position() {
        let mut ledger = fresh();
        ledger.seed_csv(SEED_DATA).unwrap();
        let expense = Expense::from_row(0, &["3/1/2026".into(), "10".into(), "Gigi".into()]);
        ledger.append(&expense).await.unwrap();
        let expenses = ledger.read_all().await.unwrap();
        assert_eq!(expenses.last().unwrap().position, Some(8));
    }

    #[tokio::test]
    async fn test_delete_shifts_later_rows() {
        let mut ledger = fresh();
        ledger.seed_csv(SEED_DATA).unwrap();
        ledger.delete_at(2).await.unwrap();
        let expenses = ledger.read_all().await.unwrap();
        assert_eq!(expenses.len(), 5);
        // The row formerly at position 3 is now at position 2.
        assert_eq!(expenses[0].position, Some(2));
        assert_eq!(expenses[0].notes, "Weekly groceries");
    }

    #[tokio::test]
    async fn test_delete_out_of_range_is_remote_error() {
        let mut ledger = fresh();
        ledger.seed_csv(SEED_DATA).unwrap();
        let err = ledger.delete_at(100).await.unwrap_err();
        assert!(matches!(err, LedgerError::Remote(_)));
        let err = ledger.delete_at(1).await.unwrap_err();
        assert!(matches!(err, LedgerError::Remote(_)));
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let mut ledger = fresh();
        ledger.seed_csv(SEED_DATA).unwrap();
        let _ = ledger.read_all().await;
        let _ = ledger.delete_at(3).await;
        let calls = ledger.get_state().calls;
        assert_eq!(calls, vec![LedgerCall::ReadAll, LedgerCall::DeleteAt(3)]);
    }

    #[tokio::test]
    async fn test_handles_share_state() {
        let key = Uuid::new_v4().to_string();
        let mut a = TestLedger::new(&key);
        let b = TestLedger::new(&key);
        a.seed_csv(SEED_DATA).unwrap();
        let _ = a.read_all().await;
        assert_eq!(b.get_state().calls, vec![LedgerCall::ReadAll]);
    }
}
