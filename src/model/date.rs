//! Helpers for the `M/D/YYYY` date format used by the ledger sheet.
//!
//! Cells keep their raw sheet text; everything that needs to compare, sort or
//! bucket dates goes through these functions, which canonicalize to ISO forms.

use chrono::{Datelike, Local, NaiveDate};

/// Parse an `M/D/YYYY` cell into a date. Returns `None` for anything that is
/// not three `/`-separated numeric parts forming a real calendar date.
pub(crate) fn parse_sheet_date(cell: &str) -> Option<NaiveDate> {
    let mut parts = cell.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render a date in the sheet's `M/D/YYYY` form (no zero padding).
pub(crate) fn to_sheet_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Parse an ISO `YYYY-MM-DD` string, the format the CLI accepts as input.
pub(crate) fn from_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// An ISO `YYYY-MM-DD` key for sorting. Unparseable cells sort first.
pub(crate) fn iso_sort_key(cell: &str) -> String {
    match parse_sheet_date(cell) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "0000-00-00".to_string(),
    }
}

/// The `YYYY-MM` bucket key for a cell, or `None` if the cell is unparseable.
pub(crate) fn month_key(cell: &str) -> Option<String> {
    parse_sheet_date(cell).map(month_key_of)
}

/// The `YYYY-MM` bucket key for a date.
pub(crate) fn month_key_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The `YYYY-MM` key immediately before `key`.
pub(crate) fn prev_month_key(key: &str) -> String {
    let (year, month) = split_month_key(key).unwrap_or((0, 1));
    if month <= 1 {
        format!("{:04}-12", year - 1)
    } else {
        format!("{:04}-{:02}", year, month - 1)
    }
}

/// `"2026-02"` -> `"February 2026"`.
pub(crate) fn month_label(key: &str) -> String {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    match split_month_key(key) {
        Some((year, month)) if (1..=12).contains(&month) => {
            format!("{} {}", MONTHS[(month - 1) as usize], year)
        }
        _ => key.to_string(),
    }
}

/// Validates a `YYYY-MM` key and splits it into year and month numbers.
pub(crate) fn split_month_key(key: &str) -> Option<(i32, u32)> {
    let (y, m) = key.split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Today, in the local timezone.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet_date() {
        let d = parse_sheet_date("3/1/2026").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        let d = parse_sheet_date("12/31/2025").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_sheet_date_rejects_garbage() {
        assert!(parse_sheet_date("").is_none());
        assert!(parse_sheet_date("2026-03-01").is_none());
        assert!(parse_sheet_date("3/1").is_none());
        assert!(parse_sheet_date("3/1/2026/extra").is_none());
        assert!(parse_sheet_date("2/30/2026").is_none());
        assert!(parse_sheet_date("not a date").is_none());
    }

    #[test]
    fn test_sheet_date_round_trip() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let cell = to_sheet_date(d);
        assert_eq!(cell, "3/9/2026");
        assert_eq!(parse_sheet_date(&cell), Some(d));
    }

    #[test]
    fn test_iso_sort_key() {
        assert_eq!(iso_sort_key("3/1/2026"), "2026-03-01");
        assert_eq!(iso_sort_key("bogus"), "0000-00-00");
        // Unparseable cells sort before everything real.
        assert!(iso_sort_key("bogus") < iso_sort_key("1/1/1900"));
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("3/1/2026").as_deref(), Some("2026-03"));
        assert_eq!(month_key("12/25/2025").as_deref(), Some("2025-12"));
        assert_eq!(month_key("nope"), None);
    }

    #[test]
    fn test_prev_month_key() {
        assert_eq!(prev_month_key("2026-03"), "2026-02");
        assert_eq!(prev_month_key("2026-01"), "2025-12");
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2026-02"), "February 2026");
        assert_eq!(month_label("2025-12"), "December 2025");
        assert_eq!(month_label("garbage"), "garbage");
    }

    #[test]
    fn test_split_month_key() {
        assert_eq!(split_month_key("2026-03"), Some((2026, 3)));
        assert_eq!(split_month_key("2026-13"), None);
        assert_eq!(split_month_key("2026"), None);
    }
}
