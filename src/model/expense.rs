//! The expense record and its mapping to ledger rows.
//!
//! The ledger tab has one header row and five columns:
//! `Date, Amount, WhoPaid, Category, Notes`. The first data row is therefore
//! row 2, and a record's `position` is its 1-based row number in the sheet.

use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column offsets within a ledger row.
const COL_DATE: usize = 0;
const COL_AMOUNT: usize = 1;
const COL_WHO_PAID: usize = 2;
const COL_CATEGORY: usize = 3;
const COL_NOTES: usize = 4;

/// The first data row of the ledger tab, just below the header.
pub const FIRST_DATA_ROW: u32 = 2;

/// The fixed set of expense categories.
///
/// `Settlement` is reserved for balance-clearing entries and is excluded from
/// spending views. Unknown cells read from the sheet fold into `Other` so one
/// stray cell cannot sink a whole load; CLI input is validated strictly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Category {
    Utilities,
    #[serde(rename = "Grocery/Toiletry")]
    GroceryToiletry,
    #[serde(rename = "House Items")]
    HouseItems,
    Settlement,
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// The categories an expense can be filed under, in display order.
    /// Excludes `Settlement`, which is only ever written by settle-up.
    pub const SPENDING: [Category; 4] = [
        Category::Utilities,
        Category::GroceryToiletry,
        Category::HouseItems,
        Category::Other,
    ];

    /// Parses a sheet cell, folding unknown values into `Other`.
    pub fn from_cell(cell: &str) -> Category {
        Category::from_str(cell).unwrap_or(Category::Other)
    }
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Expense {
    /// The 1-based row position of this record in the remote ledger, or
    /// `None` when the record has not been confirmed on the remote yet.
    /// Pending records are removed from the local cache only and must never
    /// reach the delete-by-position remote call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,

    /// The raw `M/D/YYYY` cell text.
    pub date: String,

    pub amount: Amount,

    /// One of the two configured participant names.
    pub payer: String,

    pub category: Category,

    /// Free-text description.
    pub notes: String,
}

impl Expense {
    /// True when the record exists only locally (sentinel position).
    pub fn is_pending(&self) -> bool {
        self.position.is_none()
    }

    /// Builds a record from a sheet row at the given 1-based position.
    /// Missing trailing cells default to empty, matching what the values API
    /// returns for rows with blank tail columns.
    pub fn from_row(position: u32, row: &[String]) -> Expense {
        let cell = |ix: usize| row.get(ix).map(String::as_str).unwrap_or_default();
        Expense {
            position: Some(position),
            date: cell(COL_DATE).to_string(),
            amount: Amount::parse_cell(cell(COL_AMOUNT)),
            payer: cell(COL_WHO_PAID).to_string(),
            category: Category::from_cell(cell(COL_CATEGORY)),
            notes: cell(COL_NOTES).to_string(),
        }
    }

    /// The row this record appends to the sheet as. Amounts are written as
    /// plain two-decimal strings.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.amount.to_string(),
            self.payer.clone(),
            self.category.to_string(),
            self.notes.clone(),
        ]
    }
}
