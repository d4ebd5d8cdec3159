//! State transitions invoked by the API layer.
//!
//! Every operation borrows the current snapshot and returns a new one; the
//! input is never modified. Unknown ids leave the snapshot unchanged.

use crate::dates::date_key;
use crate::models::{Habit, ProfileField, Snapshot, Task, TaskType};
use chrono::NaiveDate;
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn toggle_habit(snapshot: &Snapshot, date: NaiveDate, habit_id: &str) -> Snapshot {
    let mut next = snapshot.clone();
    if next.habit(habit_id).is_none() {
        return next;
    }

    let log = next.habit_logs.entry(date_key(date)).or_default();
    if log.habit_ids.iter().any(|id| id == habit_id) {
        log.habit_ids.retain(|id| id != habit_id);
    } else {
        log.habit_ids.push(habit_id.to_string());
    }
    next
}

pub fn toggle_task(snapshot: &Snapshot, task_id: &str) -> Snapshot {
    let mut next = snapshot.clone();
    if let Some(task) = next.tasks.iter_mut().find(|task| task.id == task_id) {
        task.completed = !task.completed;
    }
    next
}

pub fn add_task(
    snapshot: &Snapshot,
    id: String,
    title: &str,
    task_type: TaskType,
    date: NaiveDate,
) -> Snapshot {
    let mut next = snapshot.clone();
    next.tasks.push(Task {
        id,
        title: title.trim().to_string(),
        task_type,
        date: date_key(date),
        completed: false,
    });
    next
}

pub fn edit_task(snapshot: &Snapshot, task_id: &str, title: &str) -> Snapshot {
    let mut next = snapshot.clone();
    if let Some(task) = next.tasks.iter_mut().find(|task| task.id == task_id) {
        task.title = title.trim().to_string();
    }
    next
}

pub fn delete_task(snapshot: &Snapshot, task_id: &str) -> Snapshot {
    let mut next = snapshot.clone();
    next.tasks.retain(|task| task.id != task_id);
    next
}

/// `selected_date` is the day being viewed when the habit is created; the
/// habit starts counting from that day.
pub fn add_habit(
    snapshot: &Snapshot,
    id: String,
    title: &str,
    selected_date: NaiveDate,
) -> Snapshot {
    let mut next = snapshot.clone();
    next.habits.push(Habit {
        id,
        title: title.trim().to_string(),
        created_at: date_key(selected_date),
    });
    next
}

pub fn edit_habit(snapshot: &Snapshot, habit_id: &str, title: &str) -> Snapshot {
    let mut next = snapshot.clone();
    if let Some(habit) = next.habits.iter_mut().find(|habit| habit.id == habit_id) {
        habit.title = title.trim().to_string();
    }
    next
}

/// Removes the habit only. Its id stays in historical logs and is ignored by
/// scoring from then on.
pub fn delete_habit(snapshot: &Snapshot, habit_id: &str) -> Snapshot {
    let mut next = snapshot.clone();
    next.habits.retain(|habit| habit.id != habit_id);
    next
}

pub fn update_profile(snapshot: &Snapshot, field: ProfileField, value: &str) -> Snapshot {
    let mut next = snapshot.clone();
    let target = match field {
        ProfileField::Name => &mut next.user.name,
        ProfileField::Avatar => &mut next.user.avatar,
        ProfileField::Goals => &mut next.user.goals,
    };
    *target = value.to_string();
    next
}
