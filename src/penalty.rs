//! Auto-penalty for tasks left untouched past their day.
//!
//! Both categories delete the task and charge its reward minutes; the
//! balance may go negative.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::is_early_morning;
use crate::models::{Db, Task};
use crate::rewards::RewardPolicy;

// Tasks already charged this session
#[derive(Debug, Default)]
pub struct PenaltyLedger {
    seen: HashSet<Uuid>,
}

impl PenaltyLedger {
    pub fn contains(&self, id: Uuid) -> bool {
        self.seen.contains(&id)
    }

    fn record(&mut self, id: Uuid) -> bool {
        self.seen.insert(id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyReason {
    NoInteraction,
    Overdue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Penalty {
    pub task_id: Uuid,
    pub task_name: String,
    pub reason: PenaltyReason,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PenaltyReport {
    pub skipped_early_morning: bool,
    pub penalties: Vec<Penalty>,
    pub total_minutes: i64,
}

fn classify(task: &Task, ledger: &PenaltyLedger, now: DateTime<FixedOffset>) -> Option<PenaltyReason> {
    let today = now.date_naive();
    if task.is_completed || ledger.contains(task.id) || task.interacted_on(today) {
        return None;
    }
    // no-interaction is checked first
    if task.created_at.date_naive() < today {
        Some(PenaltyReason::NoInteraction)
    } else if task.due_date < today {
        Some(PenaltyReason::Overdue)
    } else {
        None
    }
}

/// Charge and delete every task that qualifies right now.
pub fn evaluate_penalties(
    db: &mut Db,
    ledger: &mut PenaltyLedger,
    now: DateTime<FixedOffset>,
    early_morning_end_hour: u32,
) -> PenaltyReport {
    if is_early_morning(now, early_morning_end_hour) {
        return PenaltyReport {
            skipped_early_morning: true,
            ..PenaltyReport::default()
        };
    }

    let mut report = PenaltyReport::default();
    db.tasks.retain(|task| {
        let Some(reason) = classify(task, ledger, now) else {
            return true;
        };
        let minutes = RewardPolicy::for_task(task).resolve().minutes;
        ledger.record(task.id);
        report.total_minutes += minutes;
        report.penalties.push(Penalty {
            task_id: task.id,
            task_name: task.name.clone(),
            reason,
            minutes,
        });
        false
    });

    if !report.penalties.is_empty() {
        let total = report.total_minutes;
        db.update_user_stats(|s| s.reward_minutes -= total);
        info!(
            tasks = report.penalties.len(),
            minutes = total,
            balance = db.stats.reward_minutes,
            "applied auto-penalty"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskLevel, TaskTemplate};
    use chrono::{Duration, TimeZone};

    fn at(d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, d, h, 0, 0)
            .unwrap()
    }

    fn task(level: TaskLevel, created: DateTime<FixedOffset>) -> Task {
        let template = TaskTemplate {
            name: "inbox zero".into(),
            level,
            duration: 20,
            repeat_days: vec![],
            group_id: "work".into(),
            custom_color: None,
            notes: None,
            reward_points: None,
            reward_time: None,
        };
        Task::from_template(&template, created.date_naive(), created)
    }

    #[test]
    fn untouched_task_from_yesterday_is_charged_and_removed() {
        let mut db = Db::default();
        let mut ledger = PenaltyLedger::default();
        db.tasks.push(task(TaskLevel::Hard, at(2, 10)));

        let report = evaluate_penalties(&mut db, &mut ledger, at(3, 9), 2);
        assert_eq!(report.total_minutes, 20);
        assert_eq!(report.penalties[0].reason, PenaltyReason::NoInteraction);
        assert_eq!(db.stats.reward_minutes, -20);
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn overdue_task_created_today_is_charged_as_overdue() {
        let mut db = Db::default();
        let mut ledger = PenaltyLedger::default();
        let mut t = task(TaskLevel::Mid, at(3, 8));
        t.due_date -= Duration::days(1);
        db.tasks.push(t);

        let report = evaluate_penalties(&mut db, &mut ledger, at(3, 9), 2);
        assert_eq!(report.penalties[0].reason, PenaltyReason::Overdue);
        assert_eq!(db.stats.reward_minutes, -10);
    }

    #[test]
    fn interaction_today_protects_the_task() {
        let mut db = Db::default();
        let mut ledger = PenaltyLedger::default();
        let mut t = task(TaskLevel::Core, at(2, 10));
        t.last_interaction_date = Some(at(3, 9).date_naive());
        db.tasks.push(t);

        let report = evaluate_penalties(&mut db, &mut ledger, at(3, 9), 2);
        assert!(report.penalties.is_empty());
        assert_eq!(db.tasks.len(), 1);
    }

    #[test]
    fn early_morning_is_skipped() {
        let mut db = Db::default();
        let mut ledger = PenaltyLedger::default();
        db.tasks.push(task(TaskLevel::Easy, at(2, 10)));

        let report = evaluate_penalties(&mut db, &mut ledger, at(3, 1), 2);
        assert!(report.skipped_early_morning);
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.stats.reward_minutes, 0);
    }

    #[test]
    fn ledger_prevents_double_charging() {
        let mut db = Db::default();
        let mut ledger = PenaltyLedger::default();
        let t = task(TaskLevel::Easy, at(2, 10));
        let copy = t.clone();
        db.tasks.push(t);

        evaluate_penalties(&mut db, &mut ledger, at(3, 9), 2);
        // the same task showing up again (e.g. a stale write) is ignored
        db.tasks.push(copy);
        let report = evaluate_penalties(&mut db, &mut ledger, at(3, 10), 2);
        assert!(report.penalties.is_empty());
        assert_eq!(db.stats.reward_minutes, -5);
    }
}
