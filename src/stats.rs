use crate::dates::{date_key, parse_date_key};
use crate::errors::AppError;
use crate::models::{CalendarDay, DayStats, Habit, Snapshot, Task, TaskFilter, TaskType};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashSet;

/// Minimum completion ratio for a day to count as on track.
pub const ON_TRACK_THRESHOLD: f64 = 0.8;

/// Default number of days the streak scan looks back, today included.
pub const STREAK_LOOKBACK_DAYS: u32 = 365;

/// Habits that count toward `date`: created on or before it.
pub fn active_habits<'a>(snapshot: &'a Snapshot, date: NaiveDate) -> Vec<&'a Habit> {
    let key = date_key(date);
    snapshot
        .habits
        .iter()
        .filter(|habit| habit.created_at.as_str() <= key.as_str())
        .collect()
}

pub fn tasks_on<'a>(snapshot: &'a Snapshot, date: NaiveDate) -> Vec<&'a Task> {
    let key = date_key(date);
    snapshot.tasks.iter().filter(|task| task.date == key).collect()
}

pub fn day_stats(snapshot: &Snapshot, date: NaiveDate) -> DayStats {
    let key = date_key(date);
    let habits = active_habits(snapshot, date);
    let tasks = tasks_on(snapshot, date);

    let total = habits.len() + tasks.len();
    if total == 0 {
        return DayStats::EMPTY;
    }

    // Log entries may name deleted or not-yet-active habits; only the
    // intersection with the active set counts.
    let logged: HashSet<&str> = snapshot
        .habit_logs
        .get(&key)
        .map(|log| log.habit_ids.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let completed_habits = habits
        .iter()
        .filter(|habit| logged.contains(habit.id.as_str()))
        .count();
    let completed_tasks = tasks.iter().filter(|task| task.completed).count();

    let completed = completed_habits + completed_tasks;
    let score = completed as f64 / total as f64;

    DayStats {
        score,
        percentage: rounded_percentage(completed, total),
        is_streak: score >= ON_TRACK_THRESHOLD,
        completed,
        total,
    }
}

/// `completed / total` as a whole percentage, exact halves rounded up.
/// Integer arithmetic keeps values like 23/40 (57.5%) from landing just
/// under the half in floating point.
fn rounded_percentage(completed: usize, total: usize) -> u8 {
    ((200 * completed + total) / (2 * total)) as u8
}

pub fn day_stats_for_key(snapshot: &Snapshot, key: &str) -> Result<DayStats, AppError> {
    Ok(day_stats(snapshot, parse_date_key(key)?))
}

pub fn current_streak(snapshot: &Snapshot, today: NaiveDate) -> u32 {
    current_streak_within(snapshot, today, STREAK_LOOKBACK_DAYS)
}

/// Counts today (if already on track) plus the unbroken run of on-track days
/// right before it. An unfinished today never breaks the run; the first
/// failing past day does. The result never exceeds `lookback_days`.
pub fn current_streak_within(snapshot: &Snapshot, today: NaiveDate, lookback_days: u32) -> u32 {
    let mut streak = 0;
    for offset in 0..lookback_days {
        let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            break;
        };
        if day_stats(snapshot, date).is_streak {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

pub fn filter_tasks<'a>(
    snapshot: &'a Snapshot,
    filter: TaskFilter,
    date: NaiveDate,
) -> Vec<&'a Task> {
    match filter {
        TaskFilter::Daily => tasks_on(snapshot, date),
        TaskFilter::Weekly => snapshot
            .tasks
            .iter()
            .filter(|task| task.task_type == TaskType::Weekly)
            .collect(),
        TaskFilter::All => snapshot.tasks.iter().collect(),
    }
}

pub fn month_calendar(
    snapshot: &Snapshot,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<Vec<CalendarDay>, AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::bad_request(format!("invalid month {year}-{month}")))?;

    let days = first
        .iter_days()
        .take_while(|date| date.month() == month)
        .map(|date| {
            let stats = day_stats(snapshot, date);
            CalendarDay {
                date: date_key(date),
                percentage: stats.percentage,
                is_streak: stats.is_streak,
                is_today: date == today,
            }
        })
        .collect();

    Ok(days)
}
