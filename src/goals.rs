//! Custom goals with optional checklist steps.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CustomGoal, Db, GoalStep};

#[derive(Debug, Clone, Deserialize)]
pub struct GoalInput {
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<i64>,
    pub current_value: Option<i64>,
    pub unit: Option<String>,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub steps: Vec<GoalStep>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reward_points: i64,
    #[serde(default)]
    pub reward_minutes: i64,
}

// Share of steps done, or all-or-nothing by the flag when there are none
pub fn completion_percentage(goal: &CustomGoal) -> u8 {
    if goal.steps.is_empty() {
        return if goal.is_completed { 100 } else { 0 };
    }
    let done = goal.steps.iter().filter(|s| s.completed).count();
    ((done as f64 / goal.steps.len() as f64) * 100.0).round() as u8
}

fn validate(input: &GoalInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::invalid("goal title required"));
    }
    if input.reward_points < 0 || input.reward_minutes < 0 {
        return Err(AppError::invalid("goal rewards cannot be negative"));
    }
    Ok(())
}

impl Db {
    pub fn goal_mut(&mut self, id: Uuid) -> Result<&mut CustomGoal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::goal_not_found(id))
    }

    // Newest first, like the listing
    pub fn create_goal(&mut self, input: GoalInput, now: DateTime<FixedOffset>) -> Result<&CustomGoal> {
        validate(&input)?;
        let goal = CustomGoal {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            target_value: input.target_value.unwrap_or(100),
            current_value: input.current_value.unwrap_or(0),
            unit: input.unit.unwrap_or_else(|| "percent".to_string()),
            target_date: input.target_date,
            is_completed: input.is_completed,
            steps: input.steps,
            notes: input.notes,
            reward_points: input.reward_points,
            reward_minutes: input.reward_minutes,
            created_at: now,
            updated_at: now,
        };
        info!(goal = %goal.title, "goal created");
        self.goals.insert(0, goal);
        Ok(&self.goals[0])
    }

    pub fn update_goal(
        &mut self,
        id: Uuid,
        input: GoalInput,
        now: DateTime<FixedOffset>,
    ) -> Result<&CustomGoal> {
        validate(&input)?;
        let goal = self.goal_mut(id)?;
        goal.title = input.title.trim().to_string();
        goal.description = input.description;
        if let Some(target) = input.target_value {
            goal.target_value = target;
        }
        if let Some(current) = input.current_value {
            goal.current_value = current;
        }
        if let Some(unit) = input.unit {
            goal.unit = unit;
        }
        goal.target_date = input.target_date;
        goal.is_completed = input.is_completed;
        goal.steps = input.steps;
        goal.notes = input.notes;
        goal.reward_points = input.reward_points;
        goal.reward_minutes = input.reward_minutes;
        goal.updated_at = now;
        Ok(goal)
    }

    pub fn toggle_goal(&mut self, id: Uuid, now: DateTime<FixedOffset>) -> Result<&CustomGoal> {
        let goal = self.goal_mut(id)?;
        goal.is_completed = !goal.is_completed;
        goal.updated_at = now;
        Ok(goal)
    }

    pub fn delete_goal(&mut self, id: Uuid) -> Result<CustomGoal> {
        let pos = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| AppError::goal_not_found(id))?;
        Ok(self.goals.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 3, 10, 0, 0)
            .unwrap()
    }

    fn input(title: &str, steps: &[bool]) -> GoalInput {
        GoalInput {
            title: title.into(),
            description: None,
            target_value: None,
            current_value: None,
            unit: None,
            target_date: None,
            is_completed: false,
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, &completed)| GoalStep {
                    id: i.to_string(),
                    text: format!("step {i}"),
                    completed,
                })
                .collect(),
            notes: String::new(),
            reward_points: 10,
            reward_minutes: 30,
        }
    }

    #[test]
    fn percentage_follows_steps() {
        let mut db = Db::default();
        let goal = db.create_goal(input("run 5k", &[true, false, false]), now()).unwrap();
        assert_eq!(completion_percentage(goal), 33);
        assert_eq!(goal.unit, "percent");
    }

    #[test]
    fn percentage_without_steps_uses_flag() {
        let mut db = Db::default();
        let id = db.create_goal(input("read", &[]), now()).unwrap().id;
        assert_eq!(completion_percentage(&db.goals[0]), 0);
        let goal = db.toggle_goal(id, now()).unwrap();
        assert_eq!(completion_percentage(goal), 100);
    }

    #[test]
    fn newest_goal_is_listed_first_and_delete_removes() {
        let mut db = Db::default();
        db.create_goal(input("first", &[]), now()).unwrap();
        let second = db.create_goal(input("second", &[]), now()).unwrap().id;
        assert_eq!(db.goals[0].title, "second");

        db.delete_goal(second).unwrap();
        assert_eq!(db.goals.len(), 1);
        assert!(matches!(db.delete_goal(second), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut db = Db::default();
        assert!(db.create_goal(input("  ", &[]), now()).is_err());
    }
}
