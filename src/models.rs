use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    /// Date key of the first day the habit counts toward scoring.
    pub created_at: String,
}

/// Advisory task category. Known values get their own variant, anything else
/// is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    #[default]
    Daily,
    Weekly,
    Other(String),
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "daily" => TaskType::Daily,
            "weekly" => TaskType::Weekly,
            _ => TaskType::Other(value),
        }
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        match value {
            TaskType::Daily => "daily".to_string(),
            TaskType::Weekly => "weekly".to_string(),
            TaskType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    pub date: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DailyLog {
    #[serde(rename = "habitIds", default)]
    pub habit_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub goals: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Traveler".to_string(),
            avatar: String::new(),
            goals: "Stay consistent and disciplined with the 80% Rule.".to_string(),
        }
    }
}

/// Complete tracker state. The persisted and exported JSON shape is
/// `{ user, habits, tasks, habitLogs }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub user: UserProfile,
    pub habits: Vec<Habit>,
    pub tasks: Vec<Task>,
    #[serde(rename = "habitLogs", default)]
    pub habit_logs: BTreeMap<String, DailyLog>,
}

impl Snapshot {
    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn is_habit_done(&self, key: &str, habit_id: &str) -> bool {
        self.habit_logs
            .get(key)
            .is_some_and(|log| log.habit_ids.iter().any(|id| id == habit_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub score: f64,
    pub percentage: u8,
    pub is_streak: bool,
    pub completed: usize,
    pub total: usize,
}

impl DayStats {
    pub const EMPTY: DayStats = DayStats {
        score: 0.0,
        percentage: 0,
        is_streak: false,
        completed: 0,
        total: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    Daily,
    Weekly,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Name,
    Avatar,
    Goals,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub filter: TaskFilter,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewHabitRequest {
    pub title: String,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub field: ProfileField,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HabitView {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayResponse {
    pub date: String,
    pub stats: DayStats,
    pub streak: u32,
    pub habits: Vec<HabitView>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreakResponse {
    pub today: String,
    pub streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: String,
    pub percentage: u8,
    pub is_streak: bool,
    pub is_today: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}
