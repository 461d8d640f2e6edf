//! Recurring expense rules.
//!
//! A rule is a template that deterministically generates concrete expenses
//! for each elapsed period up to today. `last_generated` only ever advances,
//! so a sweep is safe to run any number of times.

use crate::model::{Amount, Category};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often a recurring rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
}

serde_plain::derive_display_from_serialize!(Frequency);
serde_plain::derive_fromstr_from_deserialize!(Frequency);

/// A template for periodically generated expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringRule {
    pub id: String,
    pub description: String,
    pub amount: Amount,
    pub payer: String,
    pub category: Category,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Rules with no end date run until deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// The date of the most recently generated occurrence. Advances
    /// monotonically; the generation sweep never moves it backwards.
    pub last_generated: NaiveDate,
}

impl RecurringRule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        description: String,
        amount: Amount,
        payer: String,
        category: Category,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description,
            amount,
            payer,
            category,
            frequency,
            start_date,
            end_date,
            // The first occurrence lands one period after the start date.
            last_generated: start_date,
        }
    }

    /// True once today is past the rule's end date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| today > end)
    }

    /// The date of the next occurrence after `last_generated`.
    pub fn next_occurrence(&self) -> NaiveDate {
        next_date(self.last_generated, self.frequency)
    }
}

/// Advances a date by one period. Monthly increments clamp to the length of
/// the target month (Jan 31 -> Feb 28), so a month-end rule never drifts.
pub fn next_date(after: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => after + Days::new(7),
        Frequency::Biweekly => after + Days::new(14),
        Frequency::Monthly => after + Months::new(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(frequency: Frequency, start: NaiveDate) -> RecurringRule {
        RecurringRule::new(
            "Internet".to_string(),
            "89.99".parse().unwrap(),
            "Luke".to_string(),
            Category::Utilities,
            frequency,
            start,
            None,
        )
    }

    #[test]
    fn test_next_date_weekly() {
        assert_eq!(
            next_date(date(2026, 3, 1), Frequency::Weekly),
            date(2026, 3, 8)
        );
    }

    #[test]
    fn test_next_date_biweekly_crosses_month() {
        assert_eq!(
            next_date(date(2026, 2, 20), Frequency::Biweekly),
            date(2026, 3, 6)
        );
    }

    #[test]
    fn test_next_date_monthly_clamps_to_month_end() {
        assert_eq!(
            next_date(date(2026, 1, 31), Frequency::Monthly),
            date(2026, 2, 28)
        );
        assert_eq!(
            next_date(date(2024, 1, 31), Frequency::Monthly),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_first_occurrence_is_one_period_after_start() {
        let r = rule(Frequency::Weekly, date(2026, 3, 1));
        assert_eq!(r.next_occurrence(), date(2026, 3, 8));
    }

    #[test]
    fn test_is_expired() {
        let mut r = rule(Frequency::Monthly, date(2026, 1, 1));
        assert!(!r.is_expired(date(2026, 6, 1)));
        r.end_date = Some(date(2026, 3, 31));
        assert!(!r.is_expired(date(2026, 3, 31)));
        assert!(r.is_expired(date(2026, 4, 1)));
    }

    #[test]
    fn test_rules_get_distinct_ids() {
        let a = rule(Frequency::Weekly, date(2026, 3, 1));
        let b = rule(Frequency::Weekly, date(2026, 3, 1));
        assert_ne!(a.id, b.id);
    }
}
