// --------------------------------------------------
// Board views: filtered board, completed list, calendar day and the
// scheduled-task registry.
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::board::{self, SortBy};
use crate::error::{AppError, Result};
use crate::models::{ScheduledTask, Task};

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub group: Option<String>,
    #[serde(default)]
    pub sort: SortBy,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub date: NaiveDate,
    pub now: String,
    pub rewards_unlocked: bool,
    pub tasks: Vec<Task>,
}

// -----------------------------
// GET /api/board?group=&sort=level|name|date
// -----------------------------
pub async fn get_board(
    State(state): State<AppState>,
    Query(q): Query<BoardQuery>,
) -> Json<BoardResponse> {
    let resp = state
        .read(|engine, now| {
            let today = now.date_naive();
            BoardResponse {
                date: today,
                now: now.to_rfc3339(),
                rewards_unlocked: crate::streak::core_task_completed_today(&engine.db.tasks, today),
                tasks: board::board(&engine.db, today, q.group.as_deref(), q.sort),
            }
        })
        .await;
    Json(resp)
}

// -----------------------------
// GET /api/board/completed
// -----------------------------
pub async fn get_completed(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.read(|engine, _| board::completed(&engine.db)).await)
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub date: String, // "YYYY-MM-DD"
}

// -----------------------------
// GET /api/calendar?date=YYYY-MM-DD
// Tasks due that day plus scheduled previews
// -----------------------------
pub async fn get_calendar(
    State(state): State<AppState>,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<Vec<Task>>> {
    let date = NaiveDate::parse_from_str(&q.date, "%Y-%m-%d")
        .map_err(|_| AppError::invalid(format!("invalid date: {}", q.date)))?;
    let day = state
        .read(|engine, now| board::calendar_day(&engine.db, date, now))
        .await;
    Ok(Json(day))
}

// -----------------------------
// GET /api/scheduled
// -----------------------------
pub async fn list_scheduled(State(state): State<AppState>) -> Json<Vec<ScheduledTask>> {
    let mut entries = state.read(|engine, _| engine.db.scheduled.clone()).await;
    entries.sort_by(|a, b| a.next_date.cmp(&b.next_date).then_with(|| a.key.cmp(&b.key)));
    Json(entries)
}

// -----------------------------
// DELETE /api/scheduled/:key
// -----------------------------
pub async fn delete_scheduled(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ScheduledTask>> {
    state
        .mutate(|engine, _| {
            let pos = engine
                .db
                .scheduled
                .iter()
                .position(|st| st.key == key)
                .ok_or_else(|| AppError::NotFound {
                    kind: "scheduled task",
                    id: key.clone(),
                })?;
            Ok(Json(engine.db.scheduled.remove(pos)))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::state_at;
    use crate::intake::{LevelChoice, NewTask};
    use crate::models::{ALL_TASKS_GROUP, RepeatDay};

    fn weekly(name: &str) -> NewTask {
        NewTask {
            name: name.into(),
            level: LevelChoice::Mid,
            due_date: None,
            duration: None,
            // 2026-03-03 is a Tuesday
            repeat_days: vec![RepeatDay::Monday, RepeatDay::Wednesday],
            group_id: ALL_TASKS_GROUP.into(),
            custom_color: None,
            notes: None,
            reward_points: None,
            reward_time: None,
        }
    }

    #[tokio::test]
    async fn calendar_previews_next_occurrence() {
        let (state, _clock, _dir) = state_at("2026-03-03 10:00");
        crate::routes_tasks::create_task(State(state.clone()), Json(weekly("swim")))
            .await
            .unwrap();

        let Json(today) = get_board(
            State(state.clone()),
            Query(BoardQuery {
                group: None,
                sort: SortBy::Level,
            }),
        )
        .await;
        assert!(today.tasks.is_empty());

        let Json(wednesday) = get_calendar(
            State(state.clone()),
            Query(CalendarQuery {
                date: "2026-03-04".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(wednesday.len(), 1);
        assert!(wednesday[0].is_scheduled);
    }

    #[tokio::test]
    async fn scheduled_entries_can_be_removed() {
        let (state, _clock, _dir) = state_at("2026-03-03 10:00");
        crate::routes_tasks::create_task(State(state.clone()), Json(weekly("swim")))
            .await
            .unwrap();

        let Json(entries) = list_scheduled(State(state.clone())).await;
        let key = entries[0].key.clone();
        assert_eq!(key, "swim_all-tasks_monday-wednesday");

        delete_scheduled(State(state.clone()), Path(key.clone())).await.unwrap();
        let err = delete_scheduled(State(state), Path(key)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn bad_calendar_date_is_rejected() {
        let (state, _clock, _dir) = state_at("2026-03-03 10:00");
        let err = get_calendar(
            State(state),
            Query(CalendarQuery {
                date: "03/04/2026".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
