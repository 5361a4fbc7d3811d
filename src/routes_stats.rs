// --------------------------------------------------
// Stats, profile, reward-minute spending and maintenance endpoints.
// --------------------------------------------------

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::engine::{Lifecycle, TickReport};
use crate::error::{AppError, Result};
use crate::models::UserStats;
use crate::profile::{Achievement, Milestone, ProfilePatch, achievements, fundays_available, milestone};
use crate::streak::core_task_completed_today;
use crate::timer::{RewardSessionView, close_reward_session, spend_reward_minutes};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: UserStats,
    pub fundays_available: i64,
    pub milestone: Milestone,
    pub rewards_unlocked: bool,
}

fn stats_view(engine: &Lifecycle, now: chrono::DateTime<chrono::FixedOffset>) -> StatsResponse {
    let stats = engine.db.stats.clone();
    StatsResponse {
        fundays_available: fundays_available(&stats),
        milestone: milestone(stats.points),
        rewards_unlocked: core_task_completed_today(&engine.db.tasks, now.date_naive()),
        stats,
    }
}

// -----------------------------
// GET /api/stats
// -----------------------------
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.read(stats_view).await)
}

// -----------------------------
// PUT /api/profile
// -----------------------------
pub async fn put_profile(
    State(state): State<AppState>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<StatsResponse>> {
    state
        .mutate(|engine, now| {
            engine.db.update_profile(patch)?;
            Ok(Json(stats_view(engine, now)))
        })
        .await
}

// -----------------------------
// POST /api/stats/reset
// -----------------------------
pub async fn reset_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    state
        .mutate(|engine, now| {
            engine.db.reset_stats();
            engine.reward_session = None;
            Ok(Json(stats_view(engine, now)))
        })
        .await
}

// -----------------------------
// POST /api/stats/funday
// -----------------------------
pub async fn use_funday(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    state
        .mutate(|engine, now| {
            engine.db.use_funday()?;
            Ok(Json(stats_view(engine, now)))
        })
        .await
}

// -----------------------------
// GET /api/achievements
// -----------------------------
pub async fn get_achievements(State(state): State<AppState>) -> Json<Vec<Achievement>> {
    Json(state.read(|engine, _| achievements(&engine.db.stats)).await)
}

#[derive(Debug, Serialize)]
pub struct RewardsResponse {
    pub reward_minutes: i64,
    pub unlocked: bool,
    pub session: Option<RewardSessionView>,
}

fn rewards_view(engine: &Lifecycle, now: chrono::DateTime<chrono::FixedOffset>) -> RewardsResponse {
    RewardsResponse {
        reward_minutes: engine.db.stats.reward_minutes,
        unlocked: core_task_completed_today(&engine.db.tasks, now.date_naive()),
        session: engine.reward_session.as_ref().map(|s| s.view(now)),
    }
}

// -----------------------------
// GET /api/rewards
// -----------------------------
pub async fn get_rewards(State(state): State<AppState>) -> Json<RewardsResponse> {
    Json(state.read(rewards_view).await)
}

#[derive(Debug, Default, Deserialize)]
pub struct SpendInput {
    // Omitted means the whole balance
    pub minutes: Option<i64>,
}

// -----------------------------
// POST /api/rewards/spend
// -----------------------------
pub async fn spend_rewards(
    State(state): State<AppState>,
    Json(input): Json<SpendInput>,
) -> Result<Json<RewardsResponse>> {
    state
        .mutate(|engine, now| {
            spend_reward_minutes(&mut engine.db, &mut engine.reward_session, input.minutes, now)?;
            Ok(Json(rewards_view(engine, now)))
        })
        .await
}

fn no_session() -> AppError {
    AppError::Conflict("no reward timer is running".into())
}

// -----------------------------
// POST /api/rewards/{pause,resume}
// -----------------------------
pub async fn pause_rewards(State(state): State<AppState>) -> Result<Json<RewardsResponse>> {
    state
        .mutate(|engine, now| {
            engine.reward_session.as_mut().ok_or_else(no_session)?.pause(now);
            Ok(Json(rewards_view(engine, now)))
        })
        .await
}

pub async fn resume_rewards(State(state): State<AppState>) -> Result<Json<RewardsResponse>> {
    state
        .mutate(|engine, now| {
            engine.reward_session.as_mut().ok_or_else(no_session)?.resume(now);
            Ok(Json(rewards_view(engine, now)))
        })
        .await
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub refunded_minutes: i64,
    pub reward_minutes: i64,
}

// -----------------------------
// POST /api/rewards/close
// Unused minutes go back to the balance
// -----------------------------
pub async fn close_rewards(State(state): State<AppState>) -> Result<Json<CloseResponse>> {
    state
        .mutate(|engine, now| {
            let refunded_minutes =
                close_reward_session(&mut engine.db, &mut engine.reward_session, now)?;
            Ok(Json(CloseResponse {
                refunded_minutes,
                reward_minutes: engine.db.stats.reward_minutes,
            }))
        })
        .await
}

// -----------------------------
// POST /api/rewards/zero
// -----------------------------
pub async fn zero_rewards(State(state): State<AppState>) -> Result<Json<RewardsResponse>> {
    state
        .mutate(|engine, now| {
            engine.db.zero_reward_balance();
            Ok(Json(rewards_view(engine, now)))
        })
        .await
}

// -----------------------------
// POST /api/maintenance/tick
// Runs the day-boundary rules right now
// -----------------------------
pub async fn run_tick(State(state): State<AppState>) -> Result<Json<TickReport>> {
    Ok(Json(state.tick().await?))
}
