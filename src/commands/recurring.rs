//! Recurring-rule command handlers.

use crate::api::Mode;
use crate::args::{RecurringAddArgs, RecurringDeleteArgs};
use crate::commands::expense::{parse_amount, parse_date_or_today, parse_payer, parse_spending_category};
use crate::commands::{engine, Out};
use crate::model::{date, Frequency, RecurringRule};
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use std::str::FromStr;

/// Creates a recurring expense rule.
pub async fn recurring_add(
    config: Config,
    mode: Mode,
    args: RecurringAddArgs,
) -> Result<Out<RecurringRule>> {
    let amount = parse_amount(&args.amount)?;
    let payer = parse_payer(&config, &args.payer)?;
    let category = parse_spending_category(&args.category)?;
    let frequency = Frequency::from_str(&args.frequency).map_err(|_| {
        anyhow!(
            "Unknown frequency '{}'. Valid frequencies: weekly, biweekly, monthly",
            args.frequency
        )
    })?;
    let start = parse_date_or_today(args.start.as_deref())?;
    let end = args
        .end
        .as_deref()
        .map(|s| date::from_iso(s).with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD")))
        .transpose()?;
    if let Some(end) = end {
        if end < start {
            bail!("The end date must not be before the start date");
        }
    }

    let rule = RecurringRule::new(
        args.description,
        amount,
        payer,
        category,
        frequency,
        start,
        end,
    );

    let mut engine = engine(&config, mode).await?;
    engine.upsert_rule(rule.clone()).await?;

    let message = format!(
        "Created {} rule '{}' ({}); next occurrence {}",
        rule.frequency,
        rule.description,
        rule.id,
        date::to_sheet_date(rule.next_occurrence()),
    );
    Ok(Out::new(message, rule))
}

/// Lists the recurring rules and their next occurrences.
pub async fn recurring_list(config: Config, mode: Mode) -> Result<Out<Vec<RecurringRule>>> {
    let engine = engine(&config, mode).await?;
    let rules = engine.rules().await;
    if rules.is_empty() {
        return Ok(Out::new("No recurring expenses set up".to_string(), rules));
    }

    let today = date::today();
    let mut lines = vec![format!("{} recurring rule(s):", rules.len())];
    for rule in &rules {
        let next = if rule.is_expired(today) {
            "expired".to_string()
        } else {
            format!("next {}", date::to_sheet_date(rule.next_occurrence()))
        };
        lines.push(format!(
            "  {}  {}  {}  {}  paid by {}  {}  [{}]",
            rule.description,
            rule.amount.currency(),
            rule.frequency,
            rule.category,
            rule.payer,
            next,
            rule.id,
        ));
    }
    Ok(Out::new(lines.join("\n"), rules))
}

/// Deletes a recurring rule by id.
pub async fn recurring_delete(
    config: Config,
    mode: Mode,
    args: RecurringDeleteArgs,
) -> Result<Out<()>> {
    let mut engine = engine(&config, mode).await?;
    let message = if engine.remove_rule(&args.id).await? {
        "Deleted recurring rule"
    } else {
        "No recurring rule with that id. Run 'splitsheet recurring list' to see ids."
    };
    Ok(Out::new_message(message))
}

/// Generates any elapsed occurrences now.
pub async fn recurring_run(config: Config, mode: Mode) -> Result<Out<String>> {
    let mut engine = engine(&config, mode).await?;
    let added = engine.process_recurring().await?;
    let message = if added == 0 {
        "Nothing to generate".to_string()
    } else {
        format!("Added {added} recurring expense(s)")
    };
    Ok(Out::new(message.clone(), message))
}
