//! Types that represent the core data model, such as `Expense` and `Amount`.
mod amount;
pub(crate) mod date;
mod expense;
mod recurring;

pub use amount::Amount;
pub use expense::{Category, Expense, FIRST_DATA_ROW};
pub use recurring::{Frequency, RecurringRule};
