//! Next-occurrence calculation for recurring tasks.
//!
//! # Responsibility
//! - Compute the first occurrence of a rule strictly after a reference day.
//! - Expose the string-level `YYYYMMDD` contract used by the preview endpoint.
//!
//! # Invariants
//! - Pure: no I/O, no clock access. Callers supply `now`.
//! - At least one period is always added to the anchor, so the result is
//!   strictly after both `now` and the anchor.
//! - Yearly candidates are computed from the original anchor, so Feb 29
//!   anchors fall back to Feb 28 in common years without drifting.

use crate::model::rule::{RecurRule, RuleFormatError, MAX_DAILY_INTERVAL};
use crate::model::task::{format_task_date, parse_task_date, DateFormatError};
use chrono::{Datelike, Days, Months, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Recurrence calculation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Caller asked for the next occurrence of a one-off task.
    EmptyRule,
    /// Anchor text is not a `YYYYMMDD` date.
    InvalidDateFormat(String),
    /// Rule text is not `d <1..=400>` or `y`.
    InvalidRuleFormat(String),
    /// Calendar arithmetic left the supported date range.
    DateOutOfRange { anchor: NaiveDate },
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRule => write!(f, "repeat rule is empty; one-off tasks have no next date"),
            Self::InvalidDateFormat(raw) => write!(f, "incorrect date: `{raw}`"),
            Self::InvalidRuleFormat(raw) => write!(f, "incorrect repeat format: `{raw}`"),
            Self::DateOutOfRange { anchor } => {
                write!(f, "next occurrence after {anchor} is out of range")
            }
        }
    }
}

impl Error for RecurrenceError {}

impl From<DateFormatError> for RecurrenceError {
    fn from(value: DateFormatError) -> Self {
        Self::InvalidDateFormat(value.raw)
    }
}

impl From<RuleFormatError> for RecurrenceError {
    fn from(value: RuleFormatError) -> Self {
        Self::InvalidRuleFormat(value.raw)
    }
}

/// Returns the first occurrence of `rule`, counted from `anchor`, that is
/// strictly after `now`.
///
/// # Errors
/// - [`RecurrenceError::EmptyRule`] for [`RecurRule::None`].
/// - [`RecurrenceError::DateOutOfRange`] when the result is not representable.
pub fn next_occurrence(
    now: NaiveDate,
    anchor: NaiveDate,
    rule: RecurRule,
) -> Result<NaiveDate, RecurrenceError> {
    match rule {
        RecurRule::None => Err(RecurrenceError::EmptyRule),
        RecurRule::Daily(days) => next_daily(now, anchor, days),
        RecurRule::Yearly => next_yearly(now, anchor),
    }
}

/// String contract over [`next_occurrence`]: `YYYYMMDD` anchor and result,
/// raw rule text.
///
/// The rule is checked for emptiness first, then the anchor is parsed, then
/// the rule.
pub fn next_date(now: NaiveDate, anchor: &str, repeat: &str) -> Result<String, RecurrenceError> {
    if repeat.trim().is_empty() {
        return Err(RecurrenceError::EmptyRule);
    }
    let anchor = parse_task_date(anchor)?;
    let rule: RecurRule = repeat.parse()?;
    next_occurrence(now, anchor, rule).map(format_task_date)
}

fn next_daily(now: NaiveDate, anchor: NaiveDate, days: u32) -> Result<NaiveDate, RecurrenceError> {
    if days == 0 || days > MAX_DAILY_INTERVAL {
        return Err(RecurrenceError::InvalidRuleFormat(
            RecurRule::Daily(days).to_string(),
        ));
    }
    let step = u64::from(days);
    // Closed form of "add `days` until strictly after now", taking at least one step.
    let elapsed = u64::try_from(now.signed_duration_since(anchor).num_days()).unwrap_or(0);
    let steps = elapsed / step + 1;
    steps
        .checked_mul(step)
        .and_then(|offset| anchor.checked_add_days(Days::new(offset)))
        .ok_or(RecurrenceError::DateOutOfRange { anchor })
}

/// Candidates are `anchor + 12k months`, never a running date stepped a year
/// at a time. The two differ only for Feb 29 anchors: a running date would
/// stick to Feb 28 after the first common year, while this returns to Feb 29
/// in every leap year (20200229 with now 20230301 gives 20240229).
fn next_yearly(now: NaiveDate, anchor: NaiveDate) -> Result<NaiveDate, RecurrenceError> {
    // Every candidate before `now`'s year is <= now, so start the search there.
    let mut years = u32::try_from(now.year() - anchor.year())
        .unwrap_or(0)
        .max(1);
    loop {
        let candidate = years
            .checked_mul(12)
            .and_then(|months| anchor.checked_add_months(Months::new(months)))
            .ok_or(RecurrenceError::DateOutOfRange { anchor })?;
        if candidate > now {
            return Ok(candidate);
        }
        years += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{next_date, next_occurrence, RecurrenceError};
    use crate::model::rule::RecurRule;
    use chrono::{Datelike, Days, NaiveDate};

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y%m%d").unwrap()
    }

    #[test]
    fn daily_rule_returns_first_step_after_now() {
        let next = next_occurrence(day("20240110"), day("20240101"), RecurRule::Daily(7)).unwrap();
        assert_eq!(next, day("20240115"));
    }

    #[test]
    fn daily_rule_steps_past_now_when_landing_on_it() {
        let next = next_occurrence(day("20240108"), day("20240101"), RecurRule::Daily(7)).unwrap();
        assert_eq!(next, day("20240115"));
    }

    #[test]
    fn daily_rule_takes_one_step_when_anchor_is_in_the_future() {
        let next = next_occurrence(day("20240101"), day("20240301"), RecurRule::Daily(5)).unwrap();
        assert_eq!(next, day("20240306"));

        let same_day =
            next_occurrence(day("20240301"), day("20240301"), RecurRule::Daily(1)).unwrap();
        assert_eq!(same_day, day("20240302"));
    }

    #[test]
    fn daily_rule_is_strict_and_tight_for_all_intervals() {
        let anchor = day("20230115");
        let now = day("20240620");
        for days in [1_u32, 2, 3, 7, 30, 31, 365, 399, 400] {
            let next = next_occurrence(now, anchor, RecurRule::Daily(days)).unwrap();
            assert!(next > now, "d {days}: {next} must be after {now}");
            let previous = next - Days::new(u64::from(days));
            assert!(previous <= now, "d {days}: {previous} must not be after {now}");
            let offset = (next - anchor).num_days();
            assert_eq!(offset % i64::from(days), 0);
        }
    }

    #[test]
    fn yearly_rule_keeps_month_and_day() {
        let next = next_occurrence(day("20240105"), day("19900312"), RecurRule::Yearly).unwrap();
        assert_eq!(next, day("20240312"));

        let later = next_occurrence(day("20240401"), day("19900312"), RecurRule::Yearly).unwrap();
        assert_eq!(later, day("20250312"));
        assert_eq!((later.month(), later.day()), (3, 12));
    }

    #[test]
    fn yearly_rule_adds_a_year_to_future_anchor() {
        let next = next_occurrence(day("20240101"), day("20260704"), RecurRule::Yearly).unwrap();
        assert_eq!(next, day("20270704"));
    }

    #[test]
    fn yearly_rule_handles_leap_day_anchor() {
        let anchor = day("20200229");
        let common = next_occurrence(day("20200301"), anchor, RecurRule::Yearly).unwrap();
        assert_eq!(common, day("20210228"));

        let leap = next_occurrence(day("20230301"), anchor, RecurRule::Yearly).unwrap();
        assert_eq!(leap, day("20240229"));
    }

    #[test]
    fn yearly_rule_counts_from_the_given_anchor_only() {
        // A leap day anchor skips straight to the next Feb 29.
        let from_leap_day =
            next_occurrence(day("20230301"), day("20200229"), RecurRule::Yearly).unwrap();
        assert_eq!(from_leap_day, day("20240229"));

        // Once a completion has stored Feb 28, that date is the new anchor.
        let from_feb_28 =
            next_occurrence(day("20230301"), day("20210228"), RecurRule::Yearly).unwrap();
        assert_eq!(from_feb_28, day("20240228"));
    }

    #[test]
    fn empty_rule_is_a_usage_error() {
        let err = next_occurrence(day("20240101"), day("20240101"), RecurRule::None).unwrap_err();
        assert_eq!(err, RecurrenceError::EmptyRule);
        assert_eq!(
            next_date(day("20240101"), "20240101", "").unwrap_err(),
            RecurrenceError::EmptyRule
        );
    }

    #[test]
    fn next_date_formats_and_validates() {
        let now = day("20240126");
        assert_eq!(next_date(now, "20240113", "d 7").unwrap(), "20240127");
        assert_eq!(next_date(now, "20240113", "y").unwrap(), "20250113");
        assert_eq!(
            next_date(now, "20240113", "d 500").unwrap_err(),
            RecurrenceError::InvalidRuleFormat("d 500".to_string())
        );
        assert_eq!(
            next_date(now, "20240113", "x").unwrap_err(),
            RecurrenceError::InvalidRuleFormat("x".to_string())
        );
        assert_eq!(
            next_date(now, "2024-13-40", "d 1").unwrap_err(),
            RecurrenceError::InvalidDateFormat("2024-13-40".to_string())
        );
    }

    #[test]
    fn next_date_is_deterministic() {
        let now = day("20240126");
        let first = next_date(now, "20160229", "y").unwrap();
        let second = next_date(now, "20160229", "y").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn hand_built_daily_rule_outside_bounds_is_rejected() {
        let err = next_occurrence(day("20240101"), day("20240101"), RecurRule::Daily(0)).unwrap_err();
        assert_eq!(err, RecurrenceError::InvalidRuleFormat("d 0".to_string()));
    }

    #[test]
    fn out_of_range_result_is_reported() {
        let err = next_occurrence(NaiveDate::MAX, NaiveDate::MAX, RecurRule::Daily(1)).unwrap_err();
        assert_eq!(
            err,
            RecurrenceError::DateOutOfRange {
                anchor: NaiveDate::MAX
            }
        );
    }
}
