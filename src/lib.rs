//! questboard: a local-first gamified task board.
//!
//! Tasks earn points and reward minutes; a daily lifecycle sweeps stale
//! tasks, materializes scheduled ones, charges penalties and keeps the
//! streak. The rules live in plain modules over [`models::Db`]; the HTTP
//! layer in [`app`] and the `routes_*` modules wraps them.

pub mod app;
pub mod board;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod goals;
pub mod groups;
pub mod intake;
pub mod models;
pub mod penalty;
pub mod profile;
pub mod recurrence;
pub mod reset;
pub mod rewards;
pub mod store;
pub mod streak;
pub mod timer;

pub mod routes_board;
pub mod routes_goals;
pub mod routes_groups;
pub mod routes_stats;
pub mod routes_tasks;

pub use app::{AppState, build_router};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use engine::{Lifecycle, Rules, TickReport};
pub use error::{AppError, Result};
pub use store::Store;
