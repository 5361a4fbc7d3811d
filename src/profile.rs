/*
Profile operations on the user-stats record: edits, resets, funday spending,
point milestones and the computed achievement list.
*/

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Db, Reward, UserStats};

// Fixed early milestones, then one every 500 points
const FIRST_MILESTONES: [i64; 3] = [100, 500, 1000];
const MILESTONE_STEP: i64 = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub user_name: Option<String>,
    pub status: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Milestone {
    pub previous: i64,
    pub next: i64,
    pub percent: u8,
}

pub fn milestone(points: i64) -> Milestone {
    let points = points.max(0);
    let next = FIRST_MILESTONES
        .iter()
        .copied()
        .find(|m| points < *m)
        .unwrap_or_else(|| (points / MILESTONE_STEP + 1) * MILESTONE_STEP);
    let previous = match next {
        100 => 0,
        500 => 100,
        n => n - MILESTONE_STEP,
    };
    let percent = ((points - previous) * 100 / (next - previous)).clamp(0, 100) as u8;
    Milestone {
        previous,
        next,
        percent,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub progress: i64,
    pub target: i64,
    pub completed: bool,
    pub reward: Reward,
}

#[derive(Clone, Copy)]
enum Metric {
    CompletedTasks,
    Streak,
}

const ACHIEVEMENTS: [(&str, &str, &str, Metric, i64, Reward); 5] = [
    (
        "first-task",
        "First Steps",
        "Complete your first task",
        Metric::CompletedTasks,
        1,
        Reward { points: 10, minutes: 15 },
    ),
    (
        "task-master",
        "Task Master",
        "Complete 10 tasks",
        Metric::CompletedTasks,
        10,
        Reward { points: 50, minutes: 60 },
    ),
    (
        "streak-starter",
        "Streak Starter",
        "Maintain a 3-day streak",
        Metric::Streak,
        3,
        Reward { points: 30, minutes: 45 },
    ),
    (
        "dedicated",
        "Dedicated",
        "Maintain a 7-day streak",
        Metric::Streak,
        7,
        Reward { points: 75, minutes: 90 },
    ),
    (
        "centurion",
        "Centurion",
        "Complete 100 tasks",
        Metric::CompletedTasks,
        100,
        Reward { points: 200, minutes: 300 },
    ),
];

// Derived from the stats every time; nothing is stored
pub fn achievements(stats: &UserStats) -> Vec<Achievement> {
    ACHIEVEMENTS
        .iter()
        .map(|&(id, title, description, metric, target, reward)| {
            let value = match metric {
                Metric::CompletedTasks => stats.completed_tasks,
                Metric::Streak => stats.current_streak,
            };
            Achievement {
                id,
                title,
                description,
                progress: value.clamp(0, target),
                target,
                completed: value >= target,
                reward,
            }
        })
        .collect()
}

pub fn fundays_available(stats: &UserStats) -> i64 {
    (stats.funday_count - stats.fundays_used).max(0)
}

impl Db {
    pub fn update_profile(&mut self, patch: ProfilePatch) -> Result<&UserStats> {
        if let Some(name) = &patch.user_name {
            if name.trim().is_empty() {
                return Err(AppError::invalid("user name cannot be empty"));
            }
        }
        self.update_user_stats(|s| {
            if let Some(name) = patch.user_name {
                s.user_name = name.trim().to_string();
            }
            if let Some(status) = patch.status {
                s.status = status;
            }
            if let Some(image) = patch.profile_image {
                s.profile_image = Some(image).filter(|i| !i.is_empty());
            }
        });
        Ok(&self.stats)
    }

    // Progress goes back to zero; name, status and picture stay
    pub fn reset_stats(&mut self) {
        let kept = std::mem::take(&mut self.stats);
        self.stats = UserStats {
            user_name: kept.user_name,
            status: kept.status,
            profile_image: kept.profile_image,
            ..UserStats::default()
        };
        self.scheduler.last_streak_credit_date = None;
        info!("user stats reset");
    }

    pub fn use_funday(&mut self) -> Result<i64> {
        if fundays_available(&self.stats) == 0 {
            return Err(AppError::Conflict("no fundays available".into()));
        }
        self.update_user_stats(|s| s.fundays_used += 1);
        let left = fundays_available(&self.stats);
        info!(left, "funday used");
        Ok(left)
    }

    // Clears debt and savings alike
    pub fn zero_reward_balance(&mut self) -> i64 {
        let previous = self.stats.reward_minutes;
        self.update_user_stats(|s| s.reward_minutes = 0);
        info!(previous, "reward balance zeroed");
        previous
    }

    pub fn clear_all_tasks(&mut self) -> usize {
        let removed = self.tasks.len();
        self.tasks.clear();
        self.scheduled.clear();
        info!(removed, "all tasks cleared");
        removed
    }
}
