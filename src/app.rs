//! Shared server state, router assembly and the midnight timer.

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::clock::{Clock, until_next_reset};
use crate::engine::{Lifecycle, TickReport};
use crate::error::Result;
use crate::store::{Store, StoreError};
use crate::{routes_board, routes_goals, routes_groups, routes_stats, routes_tasks};

/// State handed to every handler.
///
/// One lock covers the whole document; each request takes it, mutates,
/// runs the lifecycle rules and persists before releasing.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<Lifecycle>>,
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(engine: Lifecycle, store: Store, clock: Arc<dyn Clock>) -> Self {
        AppState {
            engine: Arc::new(Mutex::new(engine)),
            store: Arc::new(store),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub async fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.engine.lock().await
    }

    /// Write a snapshot of the document on the blocking pool.
    ///
    /// The caller keeps the engine lock until this returns, so writes land
    /// in order. Memory is kept as is when the write fails.
    pub async fn persist(&self, engine: &Lifecycle) -> Result<()> {
        let store = Arc::clone(&self.store);
        let db = engine.db.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&db))
            .await
            .unwrap_or_else(|join| {
                Err(StoreError::Io {
                    path: self.store.path().to_path_buf(),
                    source: io::Error::other(join),
                })
            });
        saved.map_err(|e| {
            error!(path = %self.store.path().display(), error = %e, "failed to persist database");
            e.into()
        })
    }

    /// Apply a change, then run the lifecycle rules and save.
    ///
    /// Nothing is written when `change` fails.
    pub async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Lifecycle, DateTime<FixedOffset>) -> Result<T>,
    ) -> Result<T> {
        let now = self.now();
        let mut engine = self.lock().await;
        let out = change(&mut *engine, now)?;
        engine.tick(now);
        self.persist(&engine).await?;
        Ok(out)
    }

    pub async fn read<T>(&self, view: impl FnOnce(&Lifecycle, DateTime<FixedOffset>) -> T) -> T {
        let now = self.now();
        let engine = self.lock().await;
        view(&*engine, now)
    }

    pub async fn tick(&self) -> Result<TickReport> {
        let now = self.now();
        let mut engine = self.lock().await;
        let report = engine.tick(now);
        if report.changed() {
            self.persist(&engine).await?;
        }
        Ok(report)
    }
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let api = Router::new()
        // tasks
        .route(
            "/tasks",
            get(routes_tasks::list_tasks)
                .post(routes_tasks::create_task)
                .delete(routes_tasks::clear_tasks),
        )
        .route(
            "/tasks/:id",
            put(routes_tasks::update_task).delete(routes_tasks::delete_task),
        )
        .route("/tasks/:id/complete", post(routes_tasks::complete_task))
        .route("/tasks/:id/uncomplete", post(routes_tasks::uncomplete_task))
        .route("/tasks/:id/give-up", post(routes_tasks::give_up_task))
        .route("/tasks/:id/timer/start", post(routes_tasks::start_timer))
        .route("/tasks/:id/timer/pause", post(routes_tasks::pause_timer))
        .route("/tasks/:id/timer/stop", post(routes_tasks::stop_timer))
        // views
        .route("/board", get(routes_board::get_board))
        .route("/board/completed", get(routes_board::get_completed))
        .route("/calendar", get(routes_board::get_calendar))
        .route("/scheduled", get(routes_board::list_scheduled))
        .route("/scheduled/:key", delete(routes_board::delete_scheduled))
        // stats & profile
        .route("/stats", get(routes_stats::get_stats))
        .route("/profile", put(routes_stats::put_profile))
        .route("/stats/reset", post(routes_stats::reset_stats))
        .route("/stats/funday", post(routes_stats::use_funday))
        .route("/achievements", get(routes_stats::get_achievements))
        // reward minutes
        .route("/rewards", get(routes_stats::get_rewards))
        .route("/rewards/spend", post(routes_stats::spend_rewards))
        .route("/rewards/pause", post(routes_stats::pause_rewards))
        .route("/rewards/resume", post(routes_stats::resume_rewards))
        .route("/rewards/close", post(routes_stats::close_rewards))
        .route("/rewards/zero", post(routes_stats::zero_rewards))
        // groups
        .route(
            "/groups",
            get(routes_groups::list_groups).post(routes_groups::create_group),
        )
        .route(
            "/groups/:id",
            put(routes_groups::update_group).delete(routes_groups::delete_group),
        )
        .route("/groups/reorder", post(routes_groups::reorder_groups))
        // goals
        .route(
            "/goals",
            get(routes_goals::list_goals).post(routes_goals::create_goal),
        )
        .route(
            "/goals/:id",
            put(routes_goals::update_goal).delete(routes_goals::delete_goal),
        )
        .route("/goals/:id/toggle", post(routes_goals::toggle_goal))
        // maintenance
        .route("/maintenance/tick", post(routes_stats::run_tick));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Re-arms itself every night, `reset_minute` past local midnight
pub fn spawn_midnight_timer(state: AppState, reset_minute: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_reset(state.now(), reset_minute);
            debug!(secs = wait.as_secs(), "next daily reset armed");
            tokio::time::sleep(wait).await;

            match state.tick().await {
                Ok(report) => info!(
                    reset = report.reset.is_some(),
                    penalties = report.penalties.penalties.len(),
                    "midnight tick"
                ),
                Err(e) => error!(error = %e, "midnight tick could not be saved"),
            }
        }
    })
}
