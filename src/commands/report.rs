//! Read-only views: listings, the dashboard, the balance and sync status.

use crate::api::Mode;
use crate::args::{ListArgs, SortBy};
use crate::balance;
use crate::commands::{engine, Out};
use crate::model::{date, Category, Expense};
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use std::cmp::Reverse;

/// Lists one month of spending, or the settlement history.
pub async fn list(config: Config, mode: Mode, args: ListArgs) -> Result<Out<Vec<Expense>>> {
    let mut engine = engine(&config, mode).await?;
    engine.load().await?;

    if args.settlements {
        return Ok(settlement_history(engine.expenses()));
    }

    let month = match args.month {
        Some(m) => {
            if date::split_month_key(&m).is_none() {
                bail!("Invalid month '{m}', expected YYYY-MM");
            }
            m
        }
        None => date::month_key_of(date::today()),
    };

    let mut expenses: Vec<Expense> = balance::in_month(engine.expenses(), &month)
        .into_iter()
        .filter(|e| e.category != Category::Settlement)
        .cloned()
        .collect();

    match args.sort {
        SortBy::Date => expenses.sort_by_key(|e| Reverse(date::iso_sort_key(&e.date))),
        SortBy::Category => {
            expenses.sort_by_key(|e| (e.category, Reverse(date::iso_sort_key(&e.date))))
        }
    }

    let label = date::month_label(&month);
    if expenses.is_empty() {
        return Ok(Out::new(format!("No expenses in {label}"), expenses));
    }

    let (first, second) = config.participants();
    let total = balance::total(&expenses);
    let first_total = balance::paid_by(&expenses, first);
    let second_total = balance::paid_by(&expenses, second);

    let mut lines = vec![format!(
        "{} expense(s) in {label}: total {} ({first} {}, {second} {})",
        expenses.len(),
        total.currency(),
        first_total.currency(),
        second_total.currency(),
    )];
    for expense in &expenses {
        let row = match expense.position {
            Some(p) => format!("row {p}"),
            None => "pending".to_string(),
        };
        lines.push(format!(
            "  {:<8} {:<10} {:>12}  {:<6} {:<17} {}",
            row,
            expense.date,
            expense.amount.currency(),
            expense.payer,
            expense.category.to_string(),
            expense.notes,
        ));
    }
    Ok(Out::new(lines.join("\n"), expenses))
}

fn settlement_history(expenses: &[Expense]) -> Out<Vec<Expense>> {
    let mut settlements: Vec<Expense> = balance::settlements(expenses).cloned().collect();
    if settlements.is_empty() {
        return Out::new("No settlements yet".to_string(), settlements);
    }
    settlements.sort_by_key(|e| Reverse(date::iso_sort_key(&e.date)));

    let mut lines = vec![format!("{} settlement(s):", settlements.len())];
    for s in &settlements {
        lines.push(format!(
            "  {:<10} {:>12}  paid by {}",
            s.date,
            s.amount.currency(),
            s.payer
        ));
    }
    Out::new(lines.join("\n"), settlements)
}

/// The dashboard data behind the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub this_month: String,
    pub all_time: String,
    pub month_over_month_pct: Option<i64>,
    pub balance: String,
    pub categories: Vec<(String, String)>,
    pub per_person: Vec<(String, String)>,
    pub monthly_series: Vec<(String, String)>,
}

/// Shows the dashboard: totals, breakdowns and the six-month trend.
pub async fn report(config: Config, mode: Mode) -> Result<Out<Report>> {
    let mut engine = engine(&config, mode).await?;
    engine.load().await?;

    let expenses = engine.expenses();
    let spending: Vec<Expense> = balance::non_settlement(expenses).cloned().collect();
    let current = date::month_key_of(date::today());
    let previous = date::prev_month_key(&current);

    let this_month = balance::total(balance::in_month(&spending, &current));
    let last_month = balance::total(balance::in_month(&spending, &previous));
    let all_time = balance::total(&spending);
    let change = balance::percent_change(this_month, last_month);

    let (first, second) = config.participants();
    let computed = balance::compute_balance(expenses, first, second);

    let this_month_expenses: Vec<Expense> = balance::in_month(&spending, &current)
        .into_iter()
        .cloned()
        .collect();
    let categories: Vec<(String, String)> = balance::by_category(this_month_expenses.iter())
        .into_iter()
        .map(|(category, amount)| (category.to_string(), amount.currency()))
        .collect();
    let per_person = vec![
        (
            first.to_string(),
            balance::paid_by(&this_month_expenses, first).currency(),
        ),
        (
            second.to_string(),
            balance::paid_by(&this_month_expenses, second).currency(),
        ),
    ];
    let monthly_series: Vec<(String, String)> = balance::month_series(&spending, &current, 6)
        .into_iter()
        .map(|(key, amount)| (key, amount.currency()))
        .collect();

    let mut lines = vec![
        format!("This month:  {}", this_month.currency()),
        format!("All time:    {}", all_time.currency()),
    ];
    if let Some(pct) = change {
        let arrow = if pct >= 0 { "up" } else { "down" };
        lines.push(format!("             {arrow} {}% vs last month", pct.abs()));
    }
    lines.push(format!("Balance:     {}", computed.summary()));
    if !categories.is_empty() {
        lines.push(format!("By category ({}):", date::month_label(&current)));
        for (category, amount) in &categories {
            lines.push(format!("  {category:<17} {amount}"));
        }
    }
    lines.push("By person:".to_string());
    for (person, amount) in &per_person {
        lines.push(format!("  {person:<6} {amount}"));
    }
    lines.push("Monthly totals:".to_string());
    for (key, amount) in &monthly_series {
        lines.push(format!("  {key}  {amount}"));
    }

    let report = Report {
        this_month: this_month.currency(),
        all_time: all_time.currency(),
        month_over_month_pct: change,
        balance: computed.summary(),
        categories,
        per_person,
        monthly_series,
    };
    Ok(Out::new(lines.join("\n"), report))
}

/// Shows who owes whom.
pub async fn balance(config: Config, mode: Mode) -> Result<Out<String>> {
    let mut engine = engine(&config, mode).await?;
    engine.load().await?;

    let (first, second) = config.participants();
    let computed = balance::compute_balance(engine.expenses(), first, second);
    let settlement_count = balance::settlements(engine.expenses()).count();

    let lines = vec![
        computed.summary(),
        format!("  {first} paid {}", computed.first_spend.currency()),
        format!("  {second} paid {}", computed.second_spend.currency()),
        format!(
            "  Total spend {}, fair share {} each, {} settlement(s) recorded",
            computed.spend.currency(),
            computed.fair_share.currency(),
            settlement_count,
        ),
    ];
    let message = lines.join("\n");
    Ok(Out::new(message.clone(), computed.summary()))
}

/// Shows sync status, queue depths and authorization state.
pub async fn status(config: Config, mode: Mode) -> Result<Out<String>> {
    let engine = engine(&config, mode).await?;
    let (adds, deletes) = engine.queue_depths().await;
    let authorized = engine.is_authorized().await;
    let online = engine.is_online().await;
    let rules = engine.rules().await.len();

    let pending = engine.expenses().iter().filter(|e| e.is_pending()).count();
    let lines = vec![
        format!("Connectivity: {}", if online { "online" } else { "offline" }),
        format!(
            "Authorization: {}",
            if authorized { "authorized" } else { "not authorized" }
        ),
        format!(
            "Cache: {} expense(s), {} pending",
            engine.expenses().len(),
            pending
        ),
        format!("Queued: {adds} add(s), {deletes} delete(s)"),
        format!("Recurring rules: {rules}"),
    ];
    let message = lines.join("\n");
    Ok(Out::new(message.clone(), message))
}
