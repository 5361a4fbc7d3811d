/*
Read-only views over the task list: today's board and the calendar.
Kept apart from HTTP / Axum so the selection rules can be tested directly.
*/

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{ALL_TASKS_GROUP, COMPLETED_GROUP, Db, SCHEDULED_GROUP, Task};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Level,
    Name,
    Date,
}

// Level: core first; Name: case-insensitive; Date: newest first
fn compare(a: &Task, b: &Task, sort: SortBy) -> Ordering {
    match sort {
        SortBy::Level => a
            .level
            .rank()
            .cmp(&b.level.rank())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortBy::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.level.rank().cmp(&b.level.rank())),
        SortBy::Date => b.created_at.cmp(&a.created_at),
    }
}

fn is_system_view(group: &str) -> bool {
    matches!(group, ALL_TASKS_GROUP | COMPLETED_GROUP | SCHEDULED_GROUP)
}

// Select tasks for today's board.
//
// Rules:
// - Task must not be completed
// - Task must be due today
// - With a custom group, only that group's tasks; system groups show all
pub fn board(db: &Db, today: NaiveDate, group: Option<&str>, sort: SortBy) -> Vec<Task> {
    let mut tasks: Vec<Task> = db
        .tasks
        .iter()
        .filter(|t| !t.is_completed)
        .filter(|t| t.due_date == today)
        .filter(|t| match group {
            Some(g) if !is_system_view(g) => t.group_id == g,
            _ => true,
        })
        .cloned()
        .collect();
    tasks.sort_by(|a, b| compare(a, b, sort));
    tasks
}

// Everything completed, most recently touched first
pub fn completed(db: &Db) -> Vec<Task> {
    let mut tasks: Vec<Task> = db.tasks.iter().filter(|t| t.is_completed).cloned().collect();
    tasks.sort_by(|a, b| b.last_interaction_date.cmp(&a.last_interaction_date));
    tasks
}

// Tasks due on `date`, plus previews of registry entries that will
// materialize that day. Previews carry `is_scheduled = true` and are never
// stored.
pub fn calendar_day(db: &Db, date: NaiveDate, now: DateTime<FixedOffset>) -> Vec<Task> {
    let mut day: Vec<Task> = db
        .tasks
        .iter()
        .filter(|t| t.due_date == date)
        .cloned()
        .collect();

    let previews = db
        .scheduled
        .iter()
        .filter(|st| st.next_date == date && !st.created)
        .map(|st| {
            let mut preview = Task::from_template(&st.task, date, now);
            preview.is_scheduled = true;
            preview
        });
    day.extend(previews);
    day.sort_by(|a, b| compare(a, b, SortBy::Level));
    day
}
