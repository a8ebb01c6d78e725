//! Input validation helpers.

use chrono::NaiveDate;

/// Checks that `date` is an ISO calendar date (`YYYY-MM-DD`).
///
/// Concert dates are stored as strings; this is the only shape the catalog
/// accepts on create and update.
pub fn is_iso_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_dates() {
        assert!(is_iso_date("2026-01-31"));
        assert!(is_iso_date("1999-12-01"));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(!is_iso_date(""));
        assert!(!is_iso_date("31-01-2026"));
        assert!(!is_iso_date("2026-13-01"));
        assert!(!is_iso_date("2026-02-30"));
        assert!(!is_iso_date("next friday"));
    }
}
