// --------------------------------------------------
// Persistent storage (db.json) and the in-memory
// task / user-stats store the rules operate on.
// --------------------------------------------------

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::intake::{check_duration, check_reward_override};
use crate::models::{Db, Group, Task, TaskLevel, UserStats};

pub const DEFAULT_DB_PATH: &str = "data/db.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read/write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode database: {0}")]
    Encode(#[from] serde_json::Error),
}

// JSON file holding the whole Db document
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Missing file means a fresh board
    pub fn load(&self) -> Result<Db, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no database yet, starting empty");
                return Ok(Db::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let mut db: Db = serde_json::from_str(&text).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })?;
        db.ensure_system_groups();
        Ok(db)
    }

    // Write to a temp file, then rename over the old document
    pub fn save(&self, db: &Db) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(db)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, text).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), tasks = db.tasks.len(), "database saved");
        Ok(())
    }
}

// Partial task update; `None` leaves the field alone
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub level: Option<TaskLevel>,
    pub due_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub group_id: Option<String>,
    pub custom_color: Option<String>,
    pub notes: Option<String>,
    pub reward_points: Option<i64>,
    pub reward_time: Option<i64>,
}

// What a stats update changed in the derived fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsChange {
    pub fundays_earned: i64,
    pub level_up: Option<i64>,
}

impl Db {
    pub fn ensure_system_groups(&mut self) {
        for group in Group::system_groups() {
            if !self.groups.iter().any(|g| g.id == group.id) {
                self.groups.push(group);
            }
        }
    }

    pub fn task(&self, id: Uuid) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::task_not_found(id))
    }

    pub fn task_mut(&mut self, id: Uuid) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::task_not_found(id))
    }

    pub fn create_task(&mut self, task: Task) -> &Task {
        debug!(task = %task.name, due = %task.due_date, "task created");
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch, today: NaiveDate) -> Result<&Task> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(AppError::invalid("task name required"));
            }
        }
        if let Some(duration) = patch.duration {
            check_duration(duration)?;
        }
        if let Some(group_id) = &patch.group_id {
            if !self.groups.iter().any(|g| &g.id == group_id) {
                return Err(AppError::group_not_found(group_id));
            }
        }
        let current = self.task(id)?;
        check_reward_override(
            patch.reward_points.or(current.reward_points),
            patch.reward_time.or(current.reward_time),
        )?;

        let task = self.task_mut(id)?;
        if let Some(name) = patch.name {
            task.name = name.trim().to_string();
        }
        if let Some(level) = patch.level {
            task.level = level;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(duration) = patch.duration {
            task.duration = duration;
            if !task.is_active {
                task.time_remaining = duration.saturating_mul(60);
            }
        }
        if let Some(group_id) = patch.group_id {
            task.group_id = group_id;
        }
        if let Some(color) = patch.custom_color {
            task.custom_color = Some(color).filter(|c| !c.is_empty());
        }
        if let Some(notes) = patch.notes {
            let notes = notes.trim();
            task.notes = (!notes.is_empty()).then(|| notes.to_string());
        }
        if patch.reward_points.is_some() {
            task.reward_points = patch.reward_points;
        }
        if patch.reward_time.is_some() {
            task.reward_time = patch.reward_time;
        }
        task.last_interaction_date = Some(today);
        Ok(task)
    }

    pub fn delete_task(&mut self, id: Uuid) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    /// Functional update over the stats record.
    ///
    /// Derived fields are re-applied afterwards: the funday count follows
    /// `points / 100` upward only, and the level follows `points / 100 + 1`
    /// upward only.
    pub fn update_user_stats(&mut self, updater: impl FnOnce(&mut UserStats)) -> StatsChange {
        updater(&mut self.stats);
        normalize_stats(&mut self.stats)
    }
}

pub fn normalize_stats(stats: &mut UserStats) -> StatsChange {
    let earned = stats.points.max(0) / 100;
    let mut change = StatsChange::default();

    if earned > stats.funday_count {
        change.fundays_earned = earned - stats.funday_count;
        stats.funday_count = earned;
        info!(new = change.fundays_earned, total = earned, "fundays earned");
    }

    let level = earned + 1;
    if level > stats.level {
        stats.level = level;
        change.level_up = Some(level);
        info!(level, "level up");
    }
    change
}
