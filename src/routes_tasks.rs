// --------------------------------------------------
// Handles API endpoints for tasks.
//
// Responsibilities:
// - Create (with schedule routing) / list / update / delete tasks
// - Complete / un-complete / give up, with reward bookkeeping
// - Per-task countdown timer
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::Result;
use crate::intake::{Intake, NewTask, submit_task};
use crate::models::{Reward, Task};
use crate::rewards::{self, Completion};
use crate::store::TaskPatch;
use crate::timer::{self, live_remaining};

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub now: String,
    pub tasks: Vec<Task>,
}

// Timer fields reflect the live countdown at response time
fn with_live_timer(mut task: Task, now: chrono::DateTime<chrono::FixedOffset>) -> Task {
    task.time_remaining = live_remaining(&task, now);
    task
}

// -----------------------------
// GET /api/tasks
// Returns every stored task
// -----------------------------
pub async fn list_tasks(State(state): State<AppState>) -> Json<TasksResponse> {
    let resp = state
        .read(|engine, now| TasksResponse {
            now: now.to_rfc3339(),
            tasks: engine
                .db
                .tasks
                .iter()
                .cloned()
                .map(|t| with_live_timer(t, now))
                .collect(),
        })
        .await;
    Json(resp)
}

// -----------------------------
// POST /api/tasks
// Creates a task now, registers it for later, or both
// -----------------------------
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<NewTask>,
) -> Result<Json<Intake>> {
    let intake = state
        .mutate(|engine, now| submit_task(&mut engine.db, input, now))
        .await?;
    Ok(Json(intake))
}

// -----------------------------
// PUT /api/tasks/:id
// -----------------------------
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>> {
    let task = state
        .mutate(|engine, now| {
            engine
                .db
                .update_task(id, patch, now.date_naive())
                .map(Clone::clone)
        })
        .await?;
    Ok(Json(task))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

// -----------------------------
// DELETE /api/tasks/:id
// -----------------------------
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    state
        .mutate(|engine, _| {
            engine
                .db
                .delete_task(id)
                .ok_or_else(|| crate::error::AppError::task_not_found(id))?;
            Ok(Json(DeletedResponse { deleted: 1 }))
        })
        .await
}

// -----------------------------
// DELETE /api/tasks
// Clears every task and the schedule registry
// -----------------------------
pub async fn clear_tasks(State(state): State<AppState>) -> Result<Json<DeletedResponse>> {
    let deleted = state
        .mutate(|engine, _| Ok(engine.db.clear_all_tasks()))
        .await?;
    Ok(Json(DeletedResponse { deleted }))
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    // `None` when the task was already complete
    pub completion: Option<Completion>,
    pub task: Task,
}

// -----------------------------
// POST /api/tasks/:id/complete
// -----------------------------
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompleteResponse>> {
    state
        .mutate(|engine, now| {
            let completion = rewards::complete_task(&mut engine.db, id, now.date_naive())?;
            let task = engine.db.task(id)?.clone();
            Ok(Json(CompleteResponse { completion, task }))
        })
        .await
}

#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub reversed: Option<Reward>,
    pub task: Task,
}

// -----------------------------
// POST /api/tasks/:id/uncomplete
// -----------------------------
pub async fn uncomplete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RollbackResponse>> {
    state
        .mutate(|engine, now| {
            let reversed = rewards::uncomplete_task(&mut engine.db, id, now.date_naive())?;
            let task = engine.db.task(id)?.clone();
            Ok(Json(RollbackResponse { reversed, task }))
        })
        .await
}

#[derive(Debug, Serialize)]
pub struct GiveUpResponse {
    pub penalty_minutes: i64,
    pub reward_minutes: i64,
}

// -----------------------------
// POST /api/tasks/:id/give-up
// -----------------------------
pub async fn give_up_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GiveUpResponse>> {
    state
        .mutate(|engine, _| {
            let charge = rewards::give_up_task(&mut engine.db, id)?;
            Ok(Json(GiveUpResponse {
                penalty_minutes: charge.minutes,
                reward_minutes: engine.db.stats.reward_minutes,
            }))
        })
        .await
}

// -----------------------------
// POST /api/tasks/:id/timer/{start,pause,stop}
// -----------------------------
pub async fn start_timer(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Task>> {
    state
        .mutate(|engine, now| {
            let task = engine.db.task_mut(id)?;
            timer::start_task_timer(task, now, now.date_naive())?;
            Ok(Json(with_live_timer(task.clone(), now)))
        })
        .await
}

pub async fn pause_timer(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Task>> {
    state
        .mutate(|engine, now| {
            let task = engine.db.task_mut(id)?;
            timer::pause_task_timer(task, now);
            Ok(Json(task.clone()))
        })
        .await
}

pub async fn stop_timer(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Task>> {
    state
        .mutate(|engine, _| {
            let task = engine.db.task_mut(id)?;
            timer::stop_task_timer(task);
            Ok(Json(task.clone()))
        })
        .await
}
