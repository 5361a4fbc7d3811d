/*
Reward resolution and the completion / un-completion rules.
*/

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{COMPLETED_GROUP, Db, Reward, Task, TaskLevel};
use crate::store::StatsChange;

// Anything finished after its due day earns this, whatever the level
pub const LATE_COMPLETION_REWARD: Reward = Reward {
    points: 0,
    minutes: 5,
};

// Fixed reward table keyed by difficulty
pub fn level_reward(level: TaskLevel) -> Reward {
    let (points, minutes) = match level {
        TaskLevel::Core => (25, 45),
        TaskLevel::Hard => (10, 20),
        TaskLevel::Mid => (5, 10),
        TaskLevel::Easy => (2, 5),
    };
    Reward { points, minutes }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardPolicy {
    Default(TaskLevel),
    Override { points: i64, minutes: i64 },
}

impl RewardPolicy {
    // Overrides only count when both halves are present
    pub fn for_task(task: &Task) -> RewardPolicy {
        match (task.reward_points, task.reward_time) {
            (Some(points), Some(minutes)) => RewardPolicy::Override { points, minutes },
            _ => RewardPolicy::Default(task.level),
        }
    }

    pub fn resolve(self) -> Reward {
        match self {
            RewardPolicy::Default(level) => level_reward(level),
            RewardPolicy::Override { points, minutes } => Reward { points, minutes },
        }
    }
}

pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.is_completed && task.due_date < today
}

// What completing `task` today would grant
pub fn completion_reward(task: &Task, today: NaiveDate) -> Reward {
    if is_overdue(task, today) {
        LATE_COMPLETION_REWARD
    } else {
        RewardPolicy::for_task(task).resolve()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub task_id: Uuid,
    pub reward: Reward,
    pub late: bool,
    pub stats: StatsChange,
}

/// Mark a task complete and pay out its reward.
///
/// Returns `None` when the task was already complete; the payout happens
/// exactly once per completion.
pub fn complete_task(db: &mut Db, id: Uuid, today: NaiveDate) -> Result<Option<Completion>> {
    let task = db.task_mut(id)?;
    if task.is_completed {
        return Ok(None);
    }

    let late = is_overdue(task, today);
    let reward = completion_reward(task, today);

    task.is_completed = true;
    task.is_active = false;
    task.last_interaction_date = Some(today);
    task.awarded = Some(reward);
    if task.group_id != COMPLETED_GROUP {
        task.home_group_id = Some(std::mem::replace(
            &mut task.group_id,
            COMPLETED_GROUP.to_string(),
        ));
    }
    let name = task.name.clone();

    let stats = db.update_user_stats(|s| {
        s.points += reward.points;
        s.reward_minutes += reward.minutes;
        s.completed_tasks += 1;
    });

    info!(
        task = %name,
        points = reward.points,
        minutes = reward.minutes,
        late,
        "task completed"
    );
    Ok(Some(Completion {
        task_id: id,
        reward,
        late,
        stats,
    }))
}

/// Reopen a completed task and give back what its completion granted.
///
/// Fundays and levels already earned stay earned.
pub fn uncomplete_task(db: &mut Db, id: Uuid, today: NaiveDate) -> Result<Option<Reward>> {
    let task = db.task_mut(id)?;
    if !task.is_completed {
        return Ok(None);
    }

    task.is_completed = false;
    task.last_interaction_date = Some(today);
    if let Some(home) = task.home_group_id.take() {
        task.group_id = home;
    }
    let Some(reward) = task.awarded.take() else {
        warn!(task = %task.name, "reopened task had no recorded award");
        return Ok(Some(Reward {
            points: 0,
            minutes: 0,
        }));
    };
    let name = task.name.clone();

    db.update_user_stats(|s| {
        s.points -= reward.points;
        s.reward_minutes -= reward.minutes;
        s.completed_tasks = (s.completed_tasks - 1).max(0);
    });

    info!(task = %name, points = reward.points, minutes = reward.minutes, "completion reversed");
    Ok(Some(reward))
}

/// Drop a task on purpose, paying its reward minutes as a penalty.
pub fn give_up_task(db: &mut Db, id: Uuid) -> Result<Reward> {
    let task = db.task(id)?;
    let charge = RewardPolicy::for_task(task).resolve();
    let name = task.name.clone();

    db.delete_task(id);
    db.update_user_stats(|s| s.reward_minutes -= charge.minutes);

    info!(task = %name, minutes = charge.minutes, "task given up");
    Ok(charge)
}
