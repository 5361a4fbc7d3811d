//! Daily streak credit, driven by core-task completion.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::clock::yesterday;
use crate::models::{Db, Task, TaskLevel};

/// True once a core task has been completed today. Also unlocks reward
/// minute spending for the day.
pub fn core_task_completed_today(tasks: &[Task], today: NaiveDate) -> bool {
    tasks
        .iter()
        .any(|t| t.level == TaskLevel::Core && t.is_completed && t.interacted_on(today))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "streak", rename_all = "snake_case")]
pub enum StreakTransition {
    Unchanged,
    Extended(i64),
    Started,
    Broken,
}

/// Evaluate the streak for `today`.
///
/// Credit is granted at most once per day; calling again after a core task
/// is completed picks up the credit right away.
pub fn evaluate_streak(db: &mut Db, today: NaiveDate) -> StreakTransition {
    let last = db.scheduler.last_streak_credit_date;
    if last == Some(today) {
        return StreakTransition::Unchanged;
    }
    let yesterday = yesterday(today);

    if core_task_completed_today(&db.tasks, today) {
        let transition = if last == Some(yesterday) {
            db.stats.current_streak += 1;
            StreakTransition::Extended(db.stats.current_streak)
        } else {
            db.stats.current_streak = 1;
            StreakTransition::Started
        };
        db.scheduler.last_streak_credit_date = Some(today);
        info!(streak = db.stats.current_streak, "streak credited");
        return transition;
    }

    match last {
        Some(date) if date < yesterday && db.stats.current_streak != 0 => {
            db.stats.current_streak = 0;
            info!(last_credit = %date, "streak broken");
            StreakTransition::Broken
        }
        _ => StreakTransition::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskTemplate;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn completed_core(on: NaiveDate) -> Task {
        let template = TaskTemplate {
            name: "deep work".into(),
            level: TaskLevel::Core,
            duration: 90,
            repeat_days: vec![],
            group_id: "work".into(),
            custom_color: None,
            notes: None,
            reward_points: None,
            reward_time: None,
        };
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, 8, 0, 0)
            .unwrap();
        let mut t = Task::from_template(&template, on, now);
        t.is_completed = true;
        t.last_interaction_date = Some(on);
        t
    }

    #[test]
    fn consecutive_day_extends() {
        let mut db = Db::default();
        db.stats.current_streak = 4;
        db.scheduler.last_streak_credit_date = Some(today() - Duration::days(1));
        db.tasks.push(completed_core(today()));

        assert_eq!(evaluate_streak(&mut db, today()), StreakTransition::Extended(5));
        assert_eq!(db.scheduler.last_streak_credit_date, Some(today()));
        // second evaluation the same day is a no-op
        assert_eq!(evaluate_streak(&mut db, today()), StreakTransition::Unchanged);
        assert_eq!(db.stats.current_streak, 5);
    }

    #[test]
    fn gap_restarts_at_one() {
        let mut db = Db::default();
        db.stats.current_streak = 9;
        db.scheduler.last_streak_credit_date = Some(today() - Duration::days(3));
        db.tasks.push(completed_core(today()));

        assert_eq!(evaluate_streak(&mut db, today()), StreakTransition::Started);
        assert_eq!(db.stats.current_streak, 1);
    }

    #[test]
    fn missed_day_without_core_task_breaks() {
        let mut db = Db::default();
        db.stats.current_streak = 6;
        db.scheduler.last_streak_credit_date = Some(today() - Duration::days(2));

        assert_eq!(evaluate_streak(&mut db, today()), StreakTransition::Broken);
        assert_eq!(db.stats.current_streak, 0);
    }

    #[test]
    fn credit_from_yesterday_survives_until_tonight() {
        let mut db = Db::default();
        db.stats.current_streak = 2;
        db.scheduler.last_streak_credit_date = Some(today() - Duration::days(1));

        assert_eq!(evaluate_streak(&mut db, today()), StreakTransition::Unchanged);
        assert_eq!(db.stats.current_streak, 2);
    }

    #[test]
    fn core_completed_on_another_day_does_not_count() {
        let tasks = vec![completed_core(today() - Duration::days(1))];
        assert!(!core_task_completed_today(&tasks, today()));
    }
}
