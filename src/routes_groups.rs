// --------------------------------------------------
// Custom group endpoints. System groups are read-only.
// --------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::Result;
use crate::groups::GroupInput;
use crate::models::Group;

// -----------------------------
// GET /api/groups
// System groups first, then custom groups in display order
// -----------------------------
pub async fn list_groups(State(state): State<AppState>) -> Json<Vec<Group>> {
    let mut groups = state.read(|engine, _| engine.db.groups.clone()).await;
    groups.sort_by_key(|g| (!g.is_default, g.display_order));
    Json(groups)
}

// -----------------------------
// POST /api/groups
// -----------------------------
pub async fn create_group(
    State(state): State<AppState>,
    Json(input): Json<GroupInput>,
) -> Result<Json<Group>> {
    state
        .mutate(|engine, _| engine.db.create_group(input).map(|g| Json(g.clone())))
        .await
}

// -----------------------------
// PUT /api/groups/:id
// -----------------------------
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<GroupInput>,
) -> Result<Json<Group>> {
    state
        .mutate(|engine, _| engine.db.update_group(&id, input).map(|g| Json(g.clone())))
        .await
}

// -----------------------------
// DELETE /api/groups/:id
// Tasks in the group are kept
// -----------------------------
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Group>> {
    state
        .mutate(|engine, _| engine.db.delete_group(&id).map(Json))
        .await
}

#[derive(Debug, Deserialize)]
pub struct ReorderInput {
    pub ids: Vec<String>,
}

// -----------------------------
// POST /api/groups/reorder
// -----------------------------
pub async fn reorder_groups(
    State(state): State<AppState>,
    Json(input): Json<ReorderInput>,
) -> Result<Json<Vec<Group>>> {
    state
        .mutate(|engine, _| {
            engine.db.reorder_groups(&input.ids);
            Ok(Json(crate::groups::custom_groups(&engine.db)))
        })
        .await
}
