//! Elapsed-time metrics derived from case timestamps.
//!
//! The reporting date is threaded in by the caller so every derivation is
//! reproducible; the pipeline never reads the wall clock.

use crate::table::Value;
use chrono::NaiveDate;

/// Whole days between the case-start timestamp and the reporting date.
/// Unparseable starts yield None for that row only.
pub fn case_age_days(start: &Value, as_of: NaiveDate) -> Option<i64> {
    let started = start.as_date()?;
    Some(as_of.signed_duration_since(started).num_days())
}

/// Whether the case was opened on the reporting date.
pub fn created_today(start: &Value, as_of: NaiveDate) -> Option<bool> {
    Some(start.as_date()? == as_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_counts_whole_days() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let start = Value::Text("2024-06-01 09:30:00".into());
        assert_eq!(case_age_days(&start, as_of), Some(9));
        assert_eq!(created_today(&start, as_of), Some(false));

        let today = Value::Text("2024-06-10".into());
        assert_eq!(case_age_days(&today, as_of), Some(0));
        assert_eq!(created_today(&today, as_of), Some(true));
    }

    #[test]
    fn malformed_start_yields_absent() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(case_age_days(&Value::Text("n/a".into()), as_of), None);
        assert_eq!(created_today(&Value::Null, as_of), None);
    }
}
