//! New-task intake: validate a request, then either create the task now or
//! register it for later materialization.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{Db, RepeatDay, ScheduledTask, Task, TaskLevel, TaskTemplate};
use crate::recurrence::{is_daily, next_occurrence, occurs_on, schedule_key};

pub const DEFAULT_DURATION_MIN: i64 = 30;
pub const MAX_DURATION_MIN: i64 = 24 * 60;
pub const MAX_REWARD_POINTS: i64 = 1_000;
pub const MAX_REWARD_MINUTES: i64 = 24 * 60;

pub(crate) fn check_duration(duration: i64) -> Result<()> {
    if duration <= 0 {
        return Err(AppError::invalid("duration must be positive"));
    }
    if duration > MAX_DURATION_MIN {
        return Err(AppError::invalid(format!(
            "duration cannot exceed {MAX_DURATION_MIN} minutes"
        )));
    }
    Ok(())
}

// Custom rewards come as a pair, each within its bound
pub(crate) fn check_reward_override(points: Option<i64>, minutes: Option<i64>) -> Result<()> {
    match (points, minutes) {
        (None, None) => Ok(()),
        (Some(points), Some(minutes)) => {
            if !(1..=MAX_REWARD_POINTS).contains(&points) {
                return Err(AppError::invalid(format!(
                    "custom reward points must be 1..={MAX_REWARD_POINTS}"
                )));
            }
            if !(1..=MAX_REWARD_MINUTES).contains(&minutes) {
                return Err(AppError::invalid(format!(
                    "custom reward time must be 1..={MAX_REWARD_MINUTES}"
                )));
            }
            Ok(())
        }
        _ => Err(AppError::invalid(
            "custom reward needs both points and time",
        )),
    }
}

// Level picker; `Custom` carries its own reward values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LevelChoice {
    Core,
    Hard,
    Mid,
    Easy,
    Custom,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub level: LevelChoice,
    pub due_date: Option<String>, // "YYYY-MM-DD" or a timestamp
    pub duration: Option<i64>,
    #[serde(default)]
    pub repeat_days: Vec<RepeatDay>,
    pub group_id: String,
    pub custom_color: Option<String>,
    pub notes: Option<String>,
    pub reward_points: Option<i64>,
    pub reward_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Intake {
    pub created: Option<Task>,
    pub scheduled: Option<ScheduledTask>,
}

fn template_from(input: &NewTask) -> Result<TaskTemplate> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid("task name required"));
    }
    if input.group_id.trim().is_empty() {
        return Err(AppError::invalid("group required"));
    }
    let duration = input.duration.unwrap_or(DEFAULT_DURATION_MIN);
    check_duration(duration)?;

    let (level, reward_points, reward_time) = match input.level {
        LevelChoice::Custom => {
            let points = input.reward_points.unwrap_or(0);
            let minutes = input.reward_time.unwrap_or(0);
            check_reward_override(Some(points), Some(minutes))?;
            (TaskLevel::Mid, Some(points), Some(minutes))
        }
        LevelChoice::Core => (TaskLevel::Core, None, None),
        LevelChoice::Hard => (TaskLevel::Hard, None, None),
        LevelChoice::Mid => (TaskLevel::Mid, None, None),
        LevelChoice::Easy => (TaskLevel::Easy, None, None),
    };

    let mut repeat_days = input.repeat_days.clone();
    if is_daily(&repeat_days) {
        repeat_days = vec![RepeatDay::Daily];
    } else {
        repeat_days.sort();
        repeat_days.dedup();
    }

    Ok(TaskTemplate {
        name: name.to_string(),
        level,
        duration,
        repeat_days,
        group_id: input.group_id.trim().to_string(),
        custom_color: input.custom_color.clone().filter(|c| !c.is_empty()),
        notes: input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        reward_points,
        reward_time,
    })
}

fn register(db: &mut Db, entry: ScheduledTask) -> ScheduledTask {
    if let Some(existing) = db.scheduled.iter().find(|st| st.key == entry.key) {
        debug!(key = %entry.key, "already scheduled");
        return existing.clone();
    }
    info!(key = %entry.key, next = %entry.next_date, recurring = entry.is_recurring, "task scheduled");
    db.scheduled.push(entry.clone());
    entry
}

/// Accept a new task request.
///
/// - repeat days: today's instance when today matches, plus a recurring
///   registry entry at the next occurrence
/// - future due date: a one-off registry entry only
/// - otherwise: a live task due on the given date (default today)
pub fn submit_task(db: &mut Db, input: NewTask, now: DateTime<FixedOffset>) -> Result<Intake> {
    let today = now.date_naive();
    let template = template_from(&input)?;

    if !db.groups.iter().any(|g| g.id == template.group_id) {
        return Err(AppError::group_not_found(&template.group_id));
    }

    let due_date = match input.due_date.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(
            crate::clock::parse_date_part(raw)
                .ok_or_else(|| AppError::invalid(format!("invalid due_date: {raw}")))?,
        ),
        None => None,
    };
    if due_date.is_some_and(|d| d < today) {
        return Err(AppError::invalid("due_date cannot be in the past"));
    }

    let mut intake = Intake::default();

    if !template.repeat_days.is_empty() {
        if occurs_on(&template.repeat_days, today) {
            let task = Task::from_template(&template, today, now);
            intake.created = Some(db.create_task(task).clone());
        }
        let next_date = next_occurrence(&template.repeat_days, today)
            .ok_or_else(|| AppError::invalid("repeat days name no day"))?;
        intake.scheduled = Some(register(
            db,
            ScheduledTask {
                key: schedule_key(&template, None),
                task: template,
                next_date,
                is_recurring: true,
                created: false,
            },
        ));
    } else if let Some(date) = due_date.filter(|d| *d > today) {
        intake.scheduled = Some(register(
            db,
            ScheduledTask {
                key: schedule_key(&template, Some(date)),
                task: template,
                next_date: date,
                is_recurring: false,
                created: false,
            },
        ));
    } else {
        let task = Task::from_template(&template, due_date.unwrap_or(today), now);
        intake.created = Some(db.create_task(task).clone());
    }

    db.update_user_stats(|s| s.total_tasks += 1);
    Ok(intake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, SCHEDULED_GROUP};
    use chrono::{Duration, TimeZone};

    // Tuesday morning
    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 3, 10, 0, 0)
            .unwrap()
    }

    fn db() -> Db {
        let mut db = Db::default();
        db.groups.push(Group {
            id: "chores".into(),
            name: "Chores".into(),
            color: "#f97316".into(),
            icon: None,
            is_default: false,
            display_order: 3,
        });
        db
    }

    fn request(level: LevelChoice) -> NewTask {
        NewTask {
            name: "  laundry ".into(),
            level,
            due_date: None,
            duration: None,
            repeat_days: vec![],
            group_id: "chores".into(),
            custom_color: None,
            notes: Some("   ".into()),
            reward_points: None,
            reward_time: None,
        }
    }

    #[test]
    fn plain_task_is_due_today() {
        let mut db = db();
        let intake = submit_task(&mut db, request(LevelChoice::Easy), now()).unwrap();
        let task = intake.created.unwrap();
        assert_eq!(task.name, "laundry");
        assert_eq!(task.due_date, now().date_naive());
        assert_eq!(task.time_remaining, DEFAULT_DURATION_MIN * 60);
        assert_eq!(task.notes, None);
        assert!(intake.scheduled.is_none());
        assert_eq!(db.stats.total_tasks, 1);
    }

    #[test]
    fn daily_task_creates_today_and_schedules_tomorrow() {
        let mut db = db();
        let mut req = request(LevelChoice::Mid);
        req.repeat_days = vec![RepeatDay::Monday, RepeatDay::Daily];
        let intake = submit_task(&mut db, req, now()).unwrap();

        assert!(intake.created.is_some());
        let entry = intake.scheduled.unwrap();
        assert_eq!(entry.key, "laundry_chores_daily");
        assert_eq!(entry.next_date, now().date_naive() + Duration::days(1));
        assert_eq!(entry.task.repeat_days, vec![RepeatDay::Daily]);
    }

    #[test]
    fn weekday_task_skips_today_when_not_listed() {
        let mut db = db();
        let mut req = request(LevelChoice::Hard);
        req.repeat_days = vec![RepeatDay::Friday, RepeatDay::Monday];
        let intake = submit_task(&mut db, req, now()).unwrap();

        assert!(intake.created.is_none());
        let entry = intake.scheduled.unwrap();
        assert_eq!(entry.key, "laundry_chores_monday-friday");
        assert_eq!(entry.next_date, now().date_naive() + Duration::days(3));
    }

    #[test]
    fn future_one_off_only_registers() {
        let mut db = db();
        let mut req = request(LevelChoice::Core);
        req.due_date = Some("2026-03-09".into());
        let intake = submit_task(&mut db, req.clone(), now()).unwrap();
        assert!(intake.created.is_none());
        assert_eq!(db.scheduled.len(), 1);
        assert!(!db.scheduled[0].is_recurring);

        // same key twice keeps one entry
        submit_task(&mut db, req, now()).unwrap();
        assert_eq!(db.scheduled.len(), 1);
    }

    #[test]
    fn custom_level_requires_positive_rewards() {
        let mut db = db();
        let mut req = request(LevelChoice::Custom);
        req.reward_points = Some(3);
        assert!(matches!(
            submit_task(&mut db, req.clone(), now()),
            Err(AppError::Validation(_))
        ));

        req.reward_time = Some(8);
        let task = submit_task(&mut db, req, now()).unwrap().created.unwrap();
        assert_eq!(task.level, TaskLevel::Mid);
        assert_eq!((task.reward_points, task.reward_time), (Some(3), Some(8)));
    }

    #[test]
    fn past_due_date_is_rejected_without_side_effects() {
        let mut db = db();
        let mut req = request(LevelChoice::Mid);
        req.due_date = Some("2026-03-01".into());
        let err = submit_task(&mut db, req, now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(db.tasks.is_empty());
        assert_eq!(db.stats.total_tasks, 0);

        let mut req = request(LevelChoice::Mid);
        req.due_date = Some("2026-03-03".into());
        assert!(submit_task(&mut db, req, now()).unwrap().created.is_some());
    }

    #[test]
    fn oversized_duration_and_rewards_are_rejected() {
        let mut db = db();
        let mut req = request(LevelChoice::Easy);
        req.duration = Some(i64::MAX / 2);
        assert!(matches!(submit_task(&mut db, req, now()), Err(AppError::Validation(_))));

        let mut req = request(LevelChoice::Custom);
        req.reward_points = Some(i64::MAX);
        req.reward_time = Some(10);
        assert!(matches!(submit_task(&mut db, req, now()), Err(AppError::Validation(_))));

        let mut req = request(LevelChoice::Easy);
        req.duration = Some(MAX_DURATION_MIN);
        assert!(submit_task(&mut db, req, now()).is_ok());
    }

    #[test]
    fn reward_override_must_be_a_positive_pair() {
        assert!(check_reward_override(None, None).is_ok());
        assert!(check_reward_override(Some(3), Some(8)).is_ok());
        assert!(check_reward_override(Some(3), None).is_err());
        assert!(check_reward_override(Some(-500), Some(-300)).is_err());
        assert!(check_reward_override(Some(5), Some(0)).is_err());
    }

    #[test]
    fn rejects_missing_name_and_unknown_group() {
        let mut db = db();
        let mut req = request(LevelChoice::Mid);
        req.name = " ".into();
        assert!(matches!(submit_task(&mut db, req, now()), Err(AppError::Validation(_))));

        let mut req = request(LevelChoice::Mid);
        req.group_id = "nowhere".into();
        assert!(matches!(submit_task(&mut db, req, now()), Err(AppError::NotFound { .. })));

        let mut req = request(LevelChoice::Mid);
        req.group_id = SCHEDULED_GROUP.into();
        assert!(submit_task(&mut db, req, now()).is_ok());
    }
}
