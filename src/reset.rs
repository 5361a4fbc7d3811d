//! Once-a-day sweep: stale instance cleanup, registry materialization and
//! registry pruning.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Db, Task};
use crate::recurrence::{next_occurrence, occurs_on};

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    pub date: Option<NaiveDate>,
    pub removed_repeated: Vec<Uuid>,
    pub removed_expired: Vec<Uuid>,
    pub materialized: Vec<Uuid>,
    pub pruned: usize,
}

/// Run the daily reset for the local day of `now`.
///
/// Returns `None` when the reset already ran today or there is nothing to
/// evaluate yet; in the latter case the day is not marked as done.
pub fn run_daily_reset(
    db: &mut Db,
    now: DateTime<FixedOffset>,
    retention_days: i64,
) -> Option<ResetReport> {
    let today = now.date_naive();

    if db.scheduler.last_reset_date == Some(today) {
        debug!(%today, "reset already performed today");
        return None;
    }
    if db.tasks.is_empty() && db.scheduled.is_empty() {
        return None;
    }

    info!(%today, last = ?db.scheduler.last_reset_date, "running daily reset");
    let mut report = ResetReport {
        date: Some(today),
        ..ResetReport::default()
    };

    // 1 + 2: drop incomplete instances whose day has passed
    db.tasks.retain(|t| {
        if t.is_completed || t.due_date >= today {
            return true;
        }
        if t.is_repeating() {
            debug!(task = %t.name, due = %t.due_date, "removing old repeated task");
            report.removed_repeated.push(t.id);
        } else {
            debug!(task = %t.name, due = %t.due_date, "removing expired task");
            report.removed_expired.push(t.id);
        }
        false
    });

    // 3: materialize what is due today
    let mut fresh = Vec::new();
    for entry in db.scheduled.iter_mut() {
        if entry.is_recurring && !entry.created && entry.next_date < today {
            // missed days roll forward to the first occurrence from today on
            let caught_up = if occurs_on(&entry.task.repeat_days, today) {
                Some(today)
            } else {
                next_occurrence(&entry.task.repeat_days, today)
            };
            if let Some(date) = caught_up {
                debug!(key = %entry.key, from = %entry.next_date, to = %date, "catching up missed occurrence");
                entry.next_date = date;
            }
        }

        if entry.next_date != today || entry.created {
            continue;
        }

        let duplicate = db
            .tasks
            .iter()
            .chain(fresh.iter())
            .any(|t: &Task| {
                !t.is_completed
                    && t.name == entry.task.name
                    && t.group_id == entry.task.group_id
                    && t.due_date == today
            });
        if duplicate {
            debug!(key = %entry.key, "instance for today already exists");
        } else {
            let task = Task::from_template(&entry.task, today, now);
            info!(key = %entry.key, task = %task.name, "materialized scheduled task");
            report.materialized.push(task.id);
            fresh.push(task);
        }
        entry.created = true;

        if entry.is_recurring {
            match next_occurrence(&entry.task.repeat_days, today) {
                Some(next) => {
                    entry.next_date = next;
                    entry.created = false;
                }
                None => warn!(key = %entry.key, "recurring entry has no repeat days"),
            }
        }
    }
    db.tasks.extend(fresh);

    // 4: prune spent one-offs and anything past retention
    let cutoff = today - Duration::days(retention_days);
    let before = db.scheduled.len();
    db.scheduled
        .retain(|st| (st.is_recurring || !st.created) && st.next_date >= cutoff);
    report.pruned = before - db.scheduled.len();

    // 5: once per day
    db.scheduler.last_reset_date = Some(today);

    info!(
        removed = report.removed_repeated.len() + report.removed_expired.len(),
        materialized = report.materialized.len(),
        pruned = report.pruned,
        "daily reset done"
    );
    Some(report)
}
