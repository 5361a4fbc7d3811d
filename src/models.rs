use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ALL_TASKS_GROUP: &str = "all-tasks";
pub const COMPLETED_GROUP: &str = "completed-tasks";
pub const SCHEDULED_GROUP: &str = "scheduled-tasks";

// Difficulty tier, highest first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskLevel {
    Core,
    Hard,
    Mid,
    Easy,
}

impl TaskLevel {
    // Sort rank used by the board: core first, easy last
    pub fn rank(self) -> u8 {
        match self {
            TaskLevel::Core => 0,
            TaskLevel::Hard => 1,
            TaskLevel::Mid => 2,
            TaskLevel::Easy => 3,
        }
    }
}

// One entry of a task's repeat set.
// `Daily` wins over any weekday entries in the same set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RepeatDay {
    Daily,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl RepeatDay {
    pub fn weekday(self) -> Option<Weekday> {
        match self {
            RepeatDay::Daily => None,
            RepeatDay::Sunday => Some(Weekday::Sun),
            RepeatDay::Monday => Some(Weekday::Mon),
            RepeatDay::Tuesday => Some(Weekday::Tue),
            RepeatDay::Wednesday => Some(Weekday::Wed),
            RepeatDay::Thursday => Some(Weekday::Thu),
            RepeatDay::Friday => Some(Weekday::Fri),
            RepeatDay::Saturday => Some(Weekday::Sat),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RepeatDay::Daily => "daily",
            RepeatDay::Sunday => "sunday",
            RepeatDay::Monday => "monday",
            RepeatDay::Tuesday => "tuesday",
            RepeatDay::Wednesday => "wednesday",
            RepeatDay::Thursday => "thursday",
            RepeatDay::Friday => "friday",
            RepeatDay::Saturday => "saturday",
        }
    }
}

// Points and reward minutes granted (or charged) for one task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reward {
    pub points: i64,
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub level: TaskLevel,
    pub due_date: NaiveDate,
    pub duration: i64,       // minutes
    #[serde(default)]
    pub repeat_days: Vec<RepeatDay>,
    pub group_id: String,
    pub is_completed: bool,
    pub is_active: bool,
    pub time_remaining: i64, // seconds
    pub custom_color: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub notes: Option<String>,
    pub reward_points: Option<i64>,
    pub reward_time: Option<i64>,
    pub last_active_timestamp: Option<DateTime<FixedOffset>>,
    pub last_interaction_date: Option<NaiveDate>,
    // Calendar previews of registry entries; stored tasks are always false
    #[serde(default)]
    pub is_scheduled: bool,
    // What completion actually granted, so un-completing can give it back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awarded: Option<Reward>,
    // Group the task lived in before it moved to "Completed Tasks"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_group_id: Option<String>,
}

impl Task {
    // Materialize a live task from a template, due on `due_date`.
    pub fn from_template(
        template: &TaskTemplate,
        due_date: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Task {
        Task {
            id: Uuid::new_v4(),
            name: template.name.clone(),
            level: template.level,
            due_date,
            duration: template.duration,
            repeat_days: template.repeat_days.clone(),
            group_id: template.group_id.clone(),
            is_completed: false,
            is_active: false,
            time_remaining: template.duration.saturating_mul(60),
            custom_color: template.custom_color.clone(),
            created_at: now,
            notes: template.notes.clone(),
            reward_points: template.reward_points,
            reward_time: template.reward_time,
            last_active_timestamp: None,
            last_interaction_date: None,
            is_scheduled: false,
            awarded: None,
            home_group_id: None,
        }
    }

    pub fn is_repeating(&self) -> bool {
        !self.repeat_days.is_empty()
    }

    pub fn interacted_on(&self, date: NaiveDate) -> bool {
        self.last_interaction_date == Some(date)
    }
}

// The reusable part of a task, stored in the scheduled-task registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTemplate {
    pub name: String,
    pub level: TaskLevel,
    pub duration: i64,
    #[serde(default)]
    pub repeat_days: Vec<RepeatDay>,
    pub group_id: String,
    pub custom_color: Option<String>,
    pub notes: Option<String>,
    pub reward_points: Option<i64>,
    pub reward_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub key: String,
    pub task: TaskTemplate,
    pub next_date: NaiveDate,
    pub is_recurring: bool,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub level: i64,
    pub points: i64,
    pub reward_minutes: i64, // negative means debt
    pub funday_count: i64,
    #[serde(default)]
    pub fundays_used: i64,
    pub current_streak: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub profile_image: Option<String>,
    pub user_name: String,
    pub status: String,
}

impl Default for UserStats {
    fn default() -> Self {
        UserStats {
            level: 1,
            points: 0,
            reward_minutes: 0,
            funday_count: 0,
            fundays_used: 0,
            current_streak: 0,
            total_tasks: 0,
            completed_tasks: 0,
            profile_image: None,
            user_name: "User".to_string(),
            status: "Ready to achieve goals!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub display_order: i64,
}

impl Group {
    pub fn system_groups() -> Vec<Group> {
        let system = |id: &str, name: &str, color: &str, order: i64| Group {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: None,
            is_default: true,
            display_order: order,
        };
        vec![
            system(ALL_TASKS_GROUP, "All Tasks", "#3b82f6", 0),
            system(COMPLETED_GROUP, "Completed Tasks", "#22c55e", 1),
            system(SCHEDULED_GROUP, "Scheduled Tasks", "#8b5cf6", 2),
        ]
    }
}

// Day markers that used to live in browser storage
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerState {
    pub last_reset_date: Option<NaiveDate>,
    pub last_streak_credit_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalStep {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomGoal {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_value: i64,
    pub current_value: i64,
    pub unit: String,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
    #[serde(default)]
    pub steps: Vec<GoalStep>,
    #[serde(default)]
    pub notes: String,
    pub reward_points: i64,
    pub reward_minutes: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Db {
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "Group::system_groups")]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub scheduled: Vec<ScheduledTask>,
    #[serde(default)]
    pub scheduler: SchedulerState,
    #[serde(default)]
    pub goals: Vec<CustomGoal>,
}

impl Default for Db {
    fn default() -> Self {
        Db {
            stats: UserStats::default(),
            tasks: Vec::new(),
            groups: Group::system_groups(),
            scheduled: Vec::new(),
            scheduler: SchedulerState::default(),
            goals: Vec::new(),
        }
    }
}
