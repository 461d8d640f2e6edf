//! Add, delete and settle command handlers.

use crate::api::Mode;
use crate::args::{AddArgs, DeleteArgs};
use crate::balance::compute_balance;
use crate::commands::{engine, Out};
use crate::model::{date, Amount, Category, Expense, FIRST_DATA_ROW};
use crate::sync::{AddOutcome, DeleteOutcome};
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use std::str::FromStr;

/// Adds an expense: always visible locally right away, appended remotely
/// when the sheet is reachable, queued otherwise.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Expense>> {
    let amount = parse_amount(&args.amount)?;
    let payer = parse_payer(&config, &args.payer)?;
    let category = parse_spending_category(&args.category)?;
    let date = parse_date_or_today(args.date.as_deref())?;

    // The sheet has no Description column, so a description is folded into
    // the notes.
    let notes = match (args.description, args.notes) {
        (Some(description), Some(notes)) => format!("{description} - {notes}"),
        (Some(description), None) => description,
        (None, Some(notes)) => notes,
        (None, None) => String::new(),
    };

    let expense = Expense {
        position: None,
        date: date::to_sheet_date(date),
        amount,
        payer,
        category,
        notes,
    };

    let mut engine = engine(&config, mode).await?;
    let outcome = engine.add_expense(expense.clone()).await?;
    Ok(Out::new(add_outcome_message(outcome), expense))
}

/// Deletes an expense by row position, or one pending entry.
pub async fn delete(config: Config, mode: Mode, args: DeleteArgs) -> Result<Out<()>> {
    let position = match (args.row, args.pending) {
        (Some(row), false) => {
            if row < FIRST_DATA_ROW {
                bail!("Row positions start at {FIRST_DATA_ROW} (row 1 is the header)");
            }
            Some(row)
        }
        (None, true) => None,
        _ => bail!("Specify either --row <N> or --pending"),
    };

    let mut engine = engine(&config, mode).await?;
    let message = match engine.delete_expense(position).await? {
        DeleteOutcome::Deleted => "Expense deleted",
        DeleteOutcome::DeletedLocally => "Deleted locally. Will sync when online.",
        DeleteOutcome::Failed => "Failed to delete. The expense was left unchanged.",
        DeleteOutcome::NotFound => "No matching expense. Run 'splitsheet list' to see current rows.",
        DeleteOutcome::AuthExpired => "Session expired. Please sign in again.",
    };
    Ok(Out::new_message(message))
}

/// Records a settlement entry for the currently owed amount, paid by the
/// ower and dated today.
pub async fn settle(config: Config, mode: Mode) -> Result<Out<Expense>> {
    let mut engine = engine(&config, mode).await?;
    // Settle against the freshest view we can get; offline this serves the
    // cache.
    engine.load().await?;

    let (first, second) = config.participants();
    let balance = compute_balance(engine.expenses(), first, second);
    let Some((ower, payee)) = balance.direction() else {
        return Ok(Out::new_message("All settled up! Nothing to record."));
    };
    let (ower, payee) = (ower.to_string(), payee.to_string());
    let owed = balance.owed();

    let expense = Expense {
        position: None,
        date: date::to_sheet_date(date::today()),
        amount: owed,
        payer: ower.clone(),
        category: Category::Settlement,
        notes: "Settled via splitsheet".to_string(),
    };

    let message = match engine.add_expense(expense.clone()).await? {
        AddOutcome::Synced => format!(
            "Balance settled! Recorded {} from {ower} to {payee}.",
            owed.currency()
        ),
        AddOutcome::SavedOffline | AddOutcome::SavedLocally => format!(
            "Settlement of {} saved locally. Will sync when online.",
            owed.currency()
        ),
        AddOutcome::AuthExpired => "Session expired. Please sign in again.".to_string(),
    };
    Ok(Out::new(message, expense))
}

fn add_outcome_message(outcome: AddOutcome) -> &'static str {
    match outcome {
        AddOutcome::Synced => "Expense added!",
        AddOutcome::SavedOffline => "Saved offline. Will sync when online.",
        AddOutcome::SavedLocally => "Saved locally. Will sync later.",
        AddOutcome::AuthExpired => "Session expired. Please sign in again.",
    }
}

pub(super) fn parse_amount(s: &str) -> Result<Amount> {
    let amount =
        Amount::from_str(s).map_err(|e| anyhow!("Invalid amount '{s}': {e}"))?;
    if amount.is_negative() {
        bail!("The amount must not be negative");
    }
    Ok(amount)
}

pub(super) fn parse_payer(config: &Config, payer: &str) -> Result<String> {
    if !config.is_participant(payer) {
        let (first, second) = config.participants();
        bail!("Unknown payer '{payer}'; participants are {first} and {second}");
    }
    Ok(payer.to_string())
}

pub(super) fn parse_spending_category(s: &str) -> Result<Category> {
    let category = Category::from_str(s).map_err(|_| {
        let valid: Vec<String> = Category::SPENDING.iter().map(|c| c.to_string()).collect();
        anyhow!("Unknown category '{s}'. Valid categories: {}", valid.join(", "))
    })?;
    if category == Category::Settlement {
        bail!("Settlement entries are recorded with 'splitsheet settle'");
    }
    Ok(category)
}

pub(super) fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => date::from_iso(s).with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(date::today()),
    }
}
