// --------------------------------------------------
// Custom goal endpoints.
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::Result;
use crate::goals::{GoalInput, completion_percentage};
use crate::models::CustomGoal;

#[derive(Debug, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: CustomGoal,
    pub completion_percentage: u8,
}

impl From<&CustomGoal> for GoalView {
    fn from(goal: &CustomGoal) -> Self {
        GoalView {
            completion_percentage: completion_percentage(goal),
            goal: goal.clone(),
        }
    }
}

// -----------------------------
// GET /api/goals
// -----------------------------
pub async fn list_goals(State(state): State<AppState>) -> Json<Vec<GoalView>> {
    Json(
        state
            .read(|engine, _| engine.db.goals.iter().map(GoalView::from).collect())
            .await,
    )
}

// -----------------------------
// POST /api/goals
// -----------------------------
pub async fn create_goal(
    State(state): State<AppState>,
    Json(input): Json<GoalInput>,
) -> Result<Json<GoalView>> {
    state
        .mutate(|engine, now| engine.db.create_goal(input, now).map(|g| Json(g.into())))
        .await
}

// -----------------------------
// PUT /api/goals/:id
// -----------------------------
pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<GoalInput>,
) -> Result<Json<GoalView>> {
    state
        .mutate(|engine, now| engine.db.update_goal(id, input, now).map(|g| Json(g.into())))
        .await
}

// -----------------------------
// POST /api/goals/:id/toggle
// -----------------------------
pub async fn toggle_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoalView>> {
    state
        .mutate(|engine, now| engine.db.toggle_goal(id, now).map(|g| Json(g.into())))
        .await
}

// -----------------------------
// DELETE /api/goals/:id
// -----------------------------
pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoalView>> {
    state
        .mutate(|engine, _| engine.db.delete_goal(id).map(|g| Json((&g).into())))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::state_at;
    use crate::models::GoalStep;

    #[tokio::test]
    async fn goal_lifecycle_over_http_handlers() {
        let (state, _clock, _dir) = state_at("2026-03-03 10:00");
        let input = GoalInput {
            title: "Learn Rust".into(),
            description: Some("finish the book".into()),
            target_value: None,
            current_value: None,
            unit: None,
            target_date: None,
            is_completed: false,
            steps: vec![
                GoalStep {
                    id: "1".into(),
                    text: "ownership".into(),
                    completed: true,
                },
                GoalStep {
                    id: "2".into(),
                    text: "traits".into(),
                    completed: false,
                },
            ],
            notes: String::new(),
            reward_points: 0,
            reward_minutes: 0,
        };
        let Json(created) = create_goal(State(state.clone()), Json(input)).await.unwrap();
        assert_eq!(created.completion_percentage, 50);

        let Json(toggled) = toggle_goal(State(state.clone()), Path(created.goal.id)).await.unwrap();
        assert!(toggled.goal.is_completed);

        delete_goal(State(state.clone()), Path(created.goal.id)).await.unwrap();
        let Json(goals) = list_goals(State(state)).await;
        assert!(goals.is_empty());
    }
}
