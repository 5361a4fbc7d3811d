//! Countdown timers: per-task work timers and the reward-minute session.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{Db, Task};
use crate::streak::core_task_completed_today;

fn elapsed_secs(since: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> i64 {
    (now - since).num_seconds().max(0)
}

// Seconds left on a task timer, counting a running segment
pub fn live_remaining(task: &Task, now: DateTime<FixedOffset>) -> i64 {
    match (task.is_active, task.last_active_timestamp) {
        (true, Some(since)) => (task.time_remaining - elapsed_secs(since, now)).max(0),
        _ => task.time_remaining,
    }
}

pub fn start_task_timer(task: &mut Task, now: DateTime<FixedOffset>, today: NaiveDate) -> Result<()> {
    if task.is_completed {
        return Err(AppError::Conflict(format!("task {} is already completed", task.id)));
    }
    if task.is_active {
        return Ok(());
    }
    if task.time_remaining <= 0 {
        task.time_remaining = task.duration * 60;
    }
    task.is_active = true;
    task.last_active_timestamp = Some(now);
    task.last_interaction_date = Some(today);
    debug!(task = %task.name, remaining = task.time_remaining, "task timer started");
    Ok(())
}

pub fn pause_task_timer(task: &mut Task, now: DateTime<FixedOffset>) {
    if !task.is_active {
        return;
    }
    task.time_remaining = live_remaining(task, now);
    task.is_active = false;
    task.last_active_timestamp = None;
    debug!(task = %task.name, remaining = task.time_remaining, "task timer paused");
}

// Stop always rewinds to the full duration
pub fn stop_task_timer(task: &mut Task) {
    task.is_active = false;
    task.last_active_timestamp = None;
    task.time_remaining = task.duration * 60;
    debug!(task = %task.name, "task timer stopped");
}

/// A running spend of reward minutes.
///
/// Minutes leave the balance when the session starts; closing early gives
/// the unused part back, rounded up to whole minutes.
#[derive(Debug, Clone, Serialize)]
pub struct RewardSession {
    pub granted_minutes: i64,
    remaining_secs: i64,
    running_since: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardSessionView {
    pub granted_minutes: i64,
    pub remaining_secs: i64,
    pub running: bool,
}

impl RewardSession {
    fn new(minutes: i64, now: DateTime<FixedOffset>) -> Self {
        RewardSession {
            granted_minutes: minutes,
            remaining_secs: minutes * 60,
            running_since: Some(now),
        }
    }

    pub fn remaining_secs(&self, now: DateTime<FixedOffset>) -> i64 {
        match self.running_since {
            Some(since) => (self.remaining_secs - elapsed_secs(since, now)).max(0),
            None => self.remaining_secs,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn pause(&mut self, now: DateTime<FixedOffset>) {
        self.remaining_secs = self.remaining_secs(now);
        self.running_since = None;
    }

    pub fn resume(&mut self, now: DateTime<FixedOffset>) {
        if self.running_since.is_none() && self.remaining_secs > 0 {
            self.running_since = Some(now);
        }
    }

    pub fn view(&self, now: DateTime<FixedOffset>) -> RewardSessionView {
        RewardSessionView {
            granted_minutes: self.granted_minutes,
            remaining_secs: self.remaining_secs(now),
            running: self.is_running() && self.remaining_secs(now) > 0,
        }
    }

    fn unused_minutes(&self, now: DateTime<FixedOffset>) -> i64 {
        let secs = self.remaining_secs(now);
        (secs + 59) / 60
    }
}

/// Start spending reward minutes; `None` spends the whole balance.
pub fn spend_reward_minutes(
    db: &mut Db,
    session: &mut Option<RewardSession>,
    minutes: Option<i64>,
    now: DateTime<FixedOffset>,
) -> Result<RewardSessionView> {
    if !core_task_completed_today(&db.tasks, now.date_naive()) {
        return Err(AppError::RewardsLocked);
    }
    if session.is_some() {
        return Err(AppError::Conflict("a reward timer is already running".into()));
    }

    let available = db.stats.reward_minutes;
    let requested = minutes.unwrap_or(available);
    if requested <= 0 || requested > available {
        return Err(AppError::InsufficientMinutes {
            requested,
            available,
        });
    }

    db.update_user_stats(|s| s.reward_minutes -= requested);
    let started = RewardSession::new(requested, now);
    let view = started.view(now);
    *session = Some(started);
    info!(minutes = requested, balance = db.stats.reward_minutes, "reward timer started");
    Ok(view)
}

// Ends the session and returns how many minutes were refunded
pub fn close_reward_session(
    db: &mut Db,
    session: &mut Option<RewardSession>,
    now: DateTime<FixedOffset>,
) -> Result<i64> {
    let Some(active) = session.take() else {
        return Err(AppError::Conflict("no reward timer is running".into()));
    };
    let refund = active.unused_minutes(now);
    if refund > 0 {
        db.update_user_stats(|s| s.reward_minutes += refund);
    }
    info!(refund, balance = db.stats.reward_minutes, "reward timer closed");
    Ok(refund)
}
