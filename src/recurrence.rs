//! Repeat-day arithmetic for recurring tasks.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{RepeatDay, TaskTemplate};

pub fn is_daily(days: &[RepeatDay]) -> bool {
    days.contains(&RepeatDay::Daily)
}

// Sunday-based indices (0..=6) of the weekday entries, sorted and deduplicated
fn weekday_indices(days: &[RepeatDay]) -> Vec<u32> {
    let mut idx: Vec<u32> = days
        .iter()
        .filter_map(|d| d.weekday())
        .map(|w| w.num_days_from_sunday())
        .collect();
    idx.sort_unstable();
    idx.dedup();
    idx
}

/// Whether a repeat set fires on `date`.
pub fn occurs_on(days: &[RepeatDay], date: NaiveDate) -> bool {
    if is_daily(days) {
        return true;
    }
    weekday_indices(days).contains(&date.weekday().num_days_from_sunday())
}

/// First occurrence strictly after `from`.
///
/// `daily` gives the next day. Otherwise the next listed weekday later this
/// week, wrapping to the earliest listed weekday of next week. `None` when
/// the set names no day at all.
pub fn next_occurrence(days: &[RepeatDay], from: NaiveDate) -> Option<NaiveDate> {
    if is_daily(days) {
        return Some(from + Duration::days(1));
    }

    let sorted = weekday_indices(days);
    let current = from.weekday().num_days_from_sunday();

    let offset = match sorted.iter().find(|&&d| d > current) {
        Some(&next) => next - current,
        None => {
            let first = *sorted.first()?;
            7 - current + first
        }
    };
    Some(from + Duration::days(i64::from(offset)))
}

// Registry key for a template; the suffix names the schedule
pub fn schedule_key(template: &TaskTemplate, one_off_date: Option<NaiveDate>) -> String {
    let suffix = if is_daily(&template.repeat_days) {
        "daily".to_string()
    } else if !template.repeat_days.is_empty() {
        template
            .repeat_days
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join("-")
    } else {
        one_off_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    format!("{}_{}_{}", template.name, template.group_id, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    // 2026-03-03 is a Tuesday
    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
    }

    #[test]
    fn picks_later_day_in_same_week() {
        let next = next_occurrence(&[RepeatDay::Monday, RepeatDay::Wednesday], tuesday()).unwrap();
        assert_eq!(next.weekday(), Weekday::Wed);
        assert_eq!(next, tuesday() + Duration::days(1));
    }

    #[test]
    fn wraps_to_next_week() {
        let next = next_occurrence(&[RepeatDay::Monday], tuesday()).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next, tuesday() + Duration::days(6));

        // same weekday as today means a full week later
        let next = next_occurrence(&[RepeatDay::Tuesday], tuesday()).unwrap();
        assert_eq!(next, tuesday() + Duration::days(7));
    }

    #[test]
    fn daily_ignores_weekday_flags() {
        let days = [RepeatDay::Friday, RepeatDay::Daily];
        assert_eq!(next_occurrence(&days, tuesday()), Some(tuesday() + Duration::days(1)));
        assert!(occurs_on(&days, tuesday()));
    }

    #[test]
    fn sunday_sorts_first() {
        let saturday = tuesday() + Duration::days(4);
        let next = next_occurrence(&[RepeatDay::Saturday, RepeatDay::Sunday], saturday).unwrap();
        assert_eq!(next.weekday(), Weekday::Sun);
        assert_eq!(next, saturday + Duration::days(1));
    }

    #[test]
    fn empty_set_has_no_occurrence() {
        assert_eq!(next_occurrence(&[], tuesday()), None);
        assert!(!occurs_on(&[], tuesday()));
    }
}
