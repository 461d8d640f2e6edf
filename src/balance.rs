//! Pure aggregation over the expense cache: totals, the two-person balance,
//! and the month/category breakdowns behind the report views.
//!
//! Nothing here touches storage or the network; everything is a function of
//! the expense slice it is handed.

use crate::model::{date, Amount, Category, Expense};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Balances smaller than one cent are treated as exactly settled. Sheet
/// cells can carry more than two decimals, and halving an odd number of
/// cents produces half-cent remainders.
fn epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Everything except balance-clearing entries.
pub fn non_settlement(expenses: &[Expense]) -> impl Iterator<Item = &Expense> {
    expenses
        .iter()
        .filter(|e| e.category != Category::Settlement)
}

/// Settlement entries only.
pub fn settlements(expenses: &[Expense]) -> impl Iterator<Item = &Expense> {
    expenses
        .iter()
        .filter(|e| e.category == Category::Settlement)
}

/// Sum of amounts.
pub fn total<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Amount {
    expenses.into_iter().map(|e| e.amount).sum()
}

/// Sum of amounts paid by one participant.
pub fn paid_by<'a>(expenses: impl IntoIterator<Item = &'a Expense>, payer: &str) -> Amount {
    expenses
        .into_iter()
        .filter(|e| e.payer == payer)
        .map(|e| e.amount)
        .sum()
}

/// The settled-up state between the two participants.
///
/// `amount` is signed: positive means `first` owes `second`. Settlement
/// entries shift the balance toward zero by exactly their amount; a
/// settlement paid by `first` reduces what `first` owes.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub first: String,
    pub second: String,
    /// Non-settlement spend paid by `first`.
    pub first_spend: Amount,
    /// Non-settlement spend paid by `second`.
    pub second_spend: Amount,
    /// Total non-settlement spend.
    pub spend: Amount,
    /// Half the total non-settlement spend.
    pub fair_share: Amount,
    /// Signed balance; positive means `first` owes `second`.
    pub amount: Decimal,
}

impl Balance {
    pub fn is_settled(&self) -> bool {
        self.amount.abs() < epsilon()
    }

    /// The magnitude owed, regardless of direction.
    pub fn owed(&self) -> Amount {
        Amount::new(self.amount.abs())
    }

    /// `(ower, payee)`, or `None` when settled.
    pub fn direction(&self) -> Option<(&str, &str)> {
        if self.is_settled() {
            None
        } else if self.amount > Decimal::ZERO {
            Some((&self.first, &self.second))
        } else {
            Some((&self.second, &self.first))
        }
    }

    pub fn summary(&self) -> String {
        match self.direction() {
            None => "All settled up!".to_string(),
            Some((ower, payee)) => {
                format!("{ower} owes {payee} {}", self.owed().currency())
            }
        }
    }
}

/// Computes the balance between the two participants over the full cache.
pub fn compute_balance(expenses: &[Expense], first: &str, second: &str) -> Balance {
    let first_spend = paid_by(non_settlement(expenses), first);
    let second_spend = paid_by(non_settlement(expenses), second);
    let spend = first_spend + second_spend;
    let half = spend.value() / Decimal::TWO;

    // What `first` owes from spending alone, then net out settlements at
    // full value.
    let mut amount = second_spend.value() - half;
    for settlement in settlements(expenses) {
        if settlement.payer == first {
            amount -= settlement.amount.value();
        } else if settlement.payer == second {
            amount += settlement.amount.value();
        }
    }

    Balance {
        first: first.to_string(),
        second: second.to_string(),
        first_spend,
        second_spend,
        spend,
        fair_share: Amount::new(half),
        amount,
    }
}

/// Groups expenses into `YYYY-MM` buckets. Records with unparseable dates
/// are excluded here but still count toward all-time totals.
pub fn by_month(expenses: &[Expense]) -> BTreeMap<String, Vec<&Expense>> {
    let mut buckets: BTreeMap<String, Vec<&Expense>> = BTreeMap::new();
    for expense in expenses {
        if let Some(key) = date::month_key(&expense.date) {
            buckets.entry(key).or_default().push(expense);
        }
    }
    buckets
}

/// Expenses falling in one `YYYY-MM` bucket.
pub fn in_month<'a>(expenses: &'a [Expense], key: &str) -> Vec<&'a Expense> {
    expenses
        .iter()
        .filter(|e| date::month_key(&e.date).as_deref() == Some(key))
        .collect()
}

/// Per-category totals in descending order, zero categories omitted.
/// Callers filter out settlements first when building spending views.
pub fn by_category<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<(Category, Amount)> {
    let mut totals: BTreeMap<Category, Amount> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert_with(Amount::zero) += expense.amount;
    }
    let mut out: Vec<(Category, Amount)> = totals
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Monthly totals for the `n` months ending at `current_key`, oldest first.
pub fn month_series(expenses: &[Expense], current_key: &str, n: usize) -> Vec<(String, Amount)> {
    let mut keys = Vec::with_capacity(n);
    let mut key = current_key.to_string();
    for _ in 0..n {
        keys.push(key.clone());
        key = date::prev_month_key(&key);
    }
    keys.reverse();

    let buckets = by_month(expenses);
    keys.into_iter()
        .map(|key| {
            let month_total = buckets
                .get(&key)
                .map(|bucket| total(bucket.iter().copied()))
                .unwrap_or_else(Amount::zero);
            (key, month_total)
        })
        .collect()
}

/// Whole-percent month-over-month change, or `None` when the previous month
/// had no spend.
pub fn percent_change(this_month: Amount, last_month: Amount) -> Option<i64> {
    if last_month.is_zero() || last_month.is_negative() {
        return None;
    }
    let change = (this_month.value() - last_month.value()) / last_month.value()
        * Decimal::ONE_HUNDRED;
    change.round().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(date: &str, amount: &str, payer: &str, category: Category) -> Expense {
        Expense {
            position: Some(2),
            date: date.to_string(),
            amount: amount.parse().unwrap(),
            payer: payer.to_string(),
            category,
            notes: String::new(),
        }
    }

    #[test]
    fn test_single_expense_balance() {
        // Remote has one row: Luke paid $50 of utilities.
        let expenses = vec![expense("3/1/2026", "50.00", "Luke", Category::Utilities)];
        let balance = compute_balance(&expenses, "Gigi", "Luke");
        assert_eq!(balance.fair_share.to_string(), "25.00");
        assert_eq!(balance.summary(), "Gigi owes Luke $25.00");
    }

    #[test]
    fn test_settlement_clears_balance_exactly() {
        let mut expenses = vec![expense("3/1/2026", "50.00", "Luke", Category::Utilities)];
        let balance = compute_balance(&expenses, "Gigi", "Luke");
        // The ower settles the reported amount; afterwards the balance must
        // read settled.
        let owed = balance.owed();
        let (ower, _) = balance.direction().unwrap();
        expenses.push(Expense {
            position: None,
            date: "3/2/2026".to_string(),
            amount: owed,
            payer: ower.to_string(),
            category: Category::Settlement,
            notes: "Settled via app".to_string(),
        });
        let after = compute_balance(&expenses, "Gigi", "Luke");
        assert!(after.is_settled());
        assert_eq!(after.summary(), "All settled up!");
    }

    #[test]
    fn test_settlement_by_the_other_side_increases_balance() {
        let expenses = vec![
            expense("3/1/2026", "50.00", "Gigi", Category::Utilities),
            expense("3/5/2026", "25.00", "Gigi", Category::Settlement),
        ];
        // Luke owed Gigi 25; a settlement paid by Gigi pushes it to 50.
        let balance = compute_balance(&expenses, "Gigi", "Luke");
        assert_eq!(balance.summary(), "Luke owes Gigi $50.00");
    }

    #[test]
    fn test_balance_zero_sum() {
        let expenses = vec![
            expense("3/1/2026", "100.00", "Luke", Category::Utilities),
            expense("3/2/2026", "33.33", "Gigi", Category::GroceryToiletry),
            expense("3/3/2026", "10.00", "Gigi", Category::Settlement),
            expense("3/4/2026", "20.01", "Luke", Category::Other),
        ];
        let balance = compute_balance(&expenses, "Gigi", "Luke");
        // Each person's fair share, summed, equals the non-settlement spend.
        let spend = total(non_settlement(&expenses));
        let sum_of_shares = balance.fair_share + balance.fair_share;
        assert!((sum_of_shares.value() - spend.value()).abs() < epsilon());
        // And the two per-person spends add to the same total.
        assert_eq!(balance.first_spend + balance.second_spend, spend);
    }

    #[test]
    fn test_sub_cent_imbalance_is_settled() {
        // 0.01 split two ways leaves half a cent; within tolerance.
        let expenses = vec![expense("3/1/2026", "0.01", "Luke", Category::Other)];
        let balance = compute_balance(&expenses, "Gigi", "Luke");
        assert!(balance.is_settled());
    }

    #[test]
    fn test_unparseable_date_excluded_from_buckets_but_not_totals() {
        let expenses = vec![
            expense("3/1/2026", "10.00", "Luke", Category::Other),
            expense("someday", "5.00", "Gigi", Category::Other),
        ];
        let buckets = by_month(&expenses);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets["2026-03"].len(), 1);
        assert_eq!(total(&expenses).to_string(), "15.00");
    }

    #[test]
    fn test_by_category_sorted_descending() {
        let expenses = vec![
            expense("3/1/2026", "10.00", "Luke", Category::Other),
            expense("3/2/2026", "40.00", "Gigi", Category::Utilities),
            expense("3/3/2026", "25.00", "Luke", Category::GroceryToiletry),
        ];
        let breakdown = by_category(expenses.iter());
        let categories: Vec<Category> = breakdown.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            [Category::Utilities, Category::GroceryToiletry, Category::Other]
        );
    }

    #[test]
    fn test_month_series_oldest_first() {
        let expenses = vec![
            expense("1/10/2026", "10.00", "Luke", Category::Other),
            expense("2/10/2026", "20.00", "Luke", Category::Other),
            expense("3/10/2026", "30.00", "Luke", Category::Other),
        ];
        let series = month_series(&expenses, "2026-03", 3);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], ("2026-01".to_string(), "10.00".parse().unwrap()));
        assert_eq!(series[2], ("2026-03".to_string(), "30.00".parse().unwrap()));
    }

    #[test]
    fn test_percent_change() {
        let amt = |s: &str| s.parse::<Amount>().unwrap();
        assert_eq!(percent_change(amt("150"), amt("100")), Some(50));
        assert_eq!(percent_change(amt("50"), amt("100")), Some(-50));
        assert_eq!(percent_change(amt("50"), Amount::zero()), None);
    }
}
