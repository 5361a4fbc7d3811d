//! The lifecycle engine: owns the board state and runs the day-boundary
//! rules in a fixed order.
//!
//! A tick runs penalties first, so they see the task list as it was before
//! the reset sweeps out yesterday's leftovers. Inside the early-morning
//! window penalties are skipped and the sweep removes those tasks without
//! charge. The streak is evaluated last, after any materialization.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{debug, info};

use crate::models::Db;
use crate::penalty::{PenaltyLedger, PenaltyReport, evaluate_penalties};
use crate::reset::{DEFAULT_RETENTION_DAYS, ResetReport, run_daily_reset};
use crate::streak::{StreakTransition, evaluate_streak};
use crate::timer::RewardSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub early_morning_end_hour: u32,
    pub scheduled_retention_days: i64,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            early_morning_end_hour: 2,
            scheduled_retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub penalties: PenaltyReport,
    pub reset: Option<ResetReport>,
    pub streak: StreakTransition,
}

impl TickReport {
    // Whether anything in the document changed
    pub fn changed(&self) -> bool {
        !self.penalties.penalties.is_empty()
            || self.reset.is_some()
            || self.streak != StreakTransition::Unchanged
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    pub db: Db,
    pub reward_session: Option<RewardSession>,
    ledger: PenaltyLedger,
    rules: Rules,
}

impl Lifecycle {
    pub fn new(db: Db, rules: Rules) -> Self {
        Lifecycle {
            db,
            reward_session: None,
            ledger: PenaltyLedger::default(),
            rules,
        }
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Run every day-boundary rule for `now`.
    ///
    /// Safe to call as often as needed: the reset is guarded per day, the
    /// streak credit per day, and each task is penalized at most once.
    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> TickReport {
        let penalties = evaluate_penalties(
            &mut self.db,
            &mut self.ledger,
            now,
            self.rules.early_morning_end_hour,
        );
        let reset = run_daily_reset(&mut self.db, now, self.rules.scheduled_retention_days);
        let streak = evaluate_streak(&mut self.db, now.date_naive());
        self.expire_reward_session(now);

        let report = TickReport {
            penalties,
            reset,
            streak,
        };
        if report.changed() {
            info!(
                penalties = report.penalties.penalties.len(),
                reset = report.reset.is_some(),
                streak = ?report.streak,
                "lifecycle tick"
            );
        } else {
            debug!("lifecycle tick, nothing to do");
        }
        report
    }

    // A session that ran out has nothing left to refund
    fn expire_reward_session(&mut self, now: DateTime<FixedOffset>) {
        if let Some(session) = &self.reward_session {
            if session.remaining_secs(now) == 0 {
                debug!(granted = session.granted_minutes, "reward timer finished");
                self.reward_session = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RepeatDay, ScheduledTask, Task, TaskLevel, TaskTemplate};
    use chrono::{Duration, TimeZone};

    fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, d, h, m, 0)
            .unwrap()
    }

    fn daily(name: &str) -> TaskTemplate {
        TaskTemplate {
            name: name.into(),
            level: TaskLevel::Mid,
            duration: 10,
            repeat_days: vec![RepeatDay::Daily],
            group_id: "habits".into(),
            custom_color: None,
            notes: None,
            reward_points: None,
            reward_time: None,
        }
    }

    fn with_daily_instance() -> Lifecycle {
        let yesterday = at(2, 9, 0);
        let mut db = Db::default();
        let template = daily("floss");
        db.tasks.push(Task::from_template(&template, yesterday.date_naive(), yesterday));
        db.scheduled.push(ScheduledTask {
            key: "floss_habits_daily".into(),
            task: template,
            next_date: at(3, 0, 0).date_naive(),
            is_recurring: true,
            created: false,
        });
        db.scheduler.last_reset_date = Some(yesterday.date_naive());
        Lifecycle::new(db, Rules::default())
    }

    #[test]
    fn midnight_tick_sweeps_without_penalty() {
        let mut engine = with_daily_instance();
        let report = engine.tick(at(3, 0, 1));

        assert!(report.penalties.skipped_early_morning);
        let reset = report.reset.unwrap();
        assert_eq!(reset.removed_repeated.len(), 1);
        assert_eq!(reset.materialized.len(), 1);
        assert_eq!(engine.db.stats.reward_minutes, 0);
        assert_eq!(engine.db.scheduled[0].next_date, at(4, 0, 0).date_naive());
    }

    #[test]
    fn late_tick_charges_before_sweeping() {
        let mut engine = with_daily_instance();
        let report = engine.tick(at(3, 9, 0));

        assert_eq!(report.penalties.penalties.len(), 1);
        assert_eq!(engine.db.stats.reward_minutes, -10);
        // the sweep found nothing left to remove, but still materialized today
        let reset = report.reset.unwrap();
        assert!(reset.removed_repeated.is_empty());
        assert_eq!(engine.db.tasks.len(), 1);
        assert_eq!(engine.db.tasks[0].due_date, at(3, 0, 0).date_naive());
    }

    #[test]
    fn second_tick_same_day_is_quiet() {
        let mut engine = with_daily_instance();
        engine.tick(at(3, 9, 0));
        let again = engine.tick(at(3, 9, 5));
        assert!(!again.changed());
        assert_eq!(engine.db.stats.reward_minutes, -10);
    }

    #[test]
    fn finished_reward_session_is_dropped() {
        let mut engine = with_daily_instance();
        engine.tick(at(3, 9, 0));

        let mut core = Task::from_template(&daily("ship"), at(3, 0, 0).date_naive(), at(3, 9, 0));
        core.level = TaskLevel::Core;
        core.repeat_days.clear();
        let id = engine.db.create_task(core).id;
        crate::rewards::complete_task(&mut engine.db, id, at(3, 0, 0).date_naive()).unwrap();

        crate::timer::spend_reward_minutes(
            &mut engine.db,
            &mut engine.reward_session,
            Some(5),
            at(3, 10, 0),
        )
        .unwrap();
        engine.tick(at(3, 10, 0) + Duration::minutes(6));
        assert!(engine.reward_session.is_none());
    }
}
