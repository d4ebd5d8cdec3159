use crate::dates::{date_key, date_or_today, parse_date_key, today};
use crate::errors::AppError;
use crate::models::{
    CalendarQuery, CalendarResponse, DayQuery, DayResponse, Habit, HabitView, NewHabitRequest,
    NewTaskRequest, ProfileUpdateRequest, Snapshot, StreakResponse, Task, TaskListQuery,
    TitleRequest, UserProfile,
};
use crate::mutations;
use crate::state::AppState;
use crate::stats::{
    active_habits, current_streak_within, day_stats, filter_tasks, month_calendar, tasks_on,
};
use crate::storage::{export_snapshot, import_snapshot};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use tracing::info;

pub async fn get_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayResponse>, AppError> {
    let date = date_or_today(query.date.as_deref())?;
    let snapshot = state.snapshot.lock().await;
    Ok(Json(day_view(&snapshot, date, state.streak_lookback_days)))
}

pub async fn get_streak(State(state): State<AppState>) -> Json<StreakResponse> {
    let today = today();
    let snapshot = state.snapshot.lock().await;
    Json(StreakResponse {
        today: date_key(today),
        streak: current_streak_within(&snapshot, today, state.streak_lookback_days),
    })
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let snapshot = state.snapshot.lock().await;
    let days = month_calendar(&snapshot, query.year, query.month, today())?;
    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        days,
    }))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let date = date_or_today(query.date.as_deref())?;
    let snapshot = state.snapshot.lock().await;
    let tasks = filter_tasks(&snapshot, query.filter, date)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(tasks))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<NewHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let title = required_title(&payload.title)?;
    let date = date_or_today(payload.date.as_deref())?;
    let id = mutations::new_id();

    let snapshot = state
        .apply(|current| mutations::add_habit(current, id.clone(), title, date))
        .await?;
    let habit = snapshot
        .habit(&id)
        .cloned()
        .ok_or_else(|| habit_not_found(&id))?;

    info!(habit_id = %habit.id, created_at = %habit.created_at, "habit created");
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn rename_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    Json(payload): Json<TitleRequest>,
) -> Result<Json<Habit>, AppError> {
    let title = required_title(&payload.title)?;
    ensure_habit(&state, &habit_id).await?;

    let snapshot = state
        .apply(|current| mutations::edit_habit(current, &habit_id, title))
        .await?;
    let habit = snapshot
        .habit(&habit_id)
        .cloned()
        .ok_or_else(|| habit_not_found(&habit_id))?;
    Ok(Json(habit))
}

pub async fn remove_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure_habit(&state, &habit_id).await?;
    state
        .apply(|current| mutations::delete_habit(current, &habit_id))
        .await?;
    info!(habit_id = %habit_id, "habit deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayResponse>, AppError> {
    let date = date_or_today(query.date.as_deref())?;
    ensure_habit(&state, &habit_id).await?;

    let snapshot = state
        .apply(|current| mutations::toggle_habit(current, date, &habit_id))
        .await?;
    Ok(Json(day_view(&snapshot, date, state.streak_lookback_days)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let title = required_title(&payload.title)?;
    let date = date_or_today(payload.date.as_deref())?;
    let task_type = payload.task_type.unwrap_or_default();
    let id = mutations::new_id();

    let snapshot = state
        .apply(|current| mutations::add_task(current, id.clone(), title, task_type, date))
        .await?;
    let task = snapshot
        .task(&id)
        .cloned()
        .ok_or_else(|| task_not_found(&id))?;

    info!(task_id = %task.id, date = %task.date, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn rename_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<TitleRequest>,
) -> Result<Json<Task>, AppError> {
    let title = required_title(&payload.title)?;
    ensure_task(&state, &task_id).await?;

    let snapshot = state
        .apply(|current| mutations::edit_task(current, &task_id, title))
        .await?;
    let task = snapshot
        .task(&task_id)
        .cloned()
        .ok_or_else(|| task_not_found(&task_id))?;
    Ok(Json(task))
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure_task(&state, &task_id).await?;
    state
        .apply(|current| mutations::delete_task(current, &task_id))
        .await?;
    info!(task_id = %task_id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<DayResponse>, AppError> {
    ensure_task(&state, &task_id).await?;

    let snapshot = state
        .apply(|current| mutations::toggle_task(current, &task_id))
        .await?;
    let task = snapshot
        .task(&task_id)
        .ok_or_else(|| task_not_found(&task_id))?;
    let date = parse_date_key(&task.date)?;
    Ok(Json(day_view(&snapshot, date, state.streak_lookback_days)))
}

pub async fn get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    let snapshot = state.snapshot.lock().await;
    Json(snapshot.user.clone())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let snapshot = state
        .apply(|current| mutations::update_profile(current, payload.field, &payload.value))
        .await?;
    Ok(Json(snapshot.user))
}

pub async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.current().await;
    let body = export_snapshot(&snapshot)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"on-track-backup.json\"",
            ),
        ],
        body,
    ))
}

pub async fn import_data(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Snapshot>, AppError> {
    let imported = import_snapshot(&body)?;
    let snapshot = state.apply(move |_| imported).await?;
    info!(
        habits = snapshot.habits.len(),
        tasks = snapshot.tasks.len(),
        "snapshot imported"
    );
    Ok(Json(snapshot))
}

fn day_view(snapshot: &Snapshot, date: NaiveDate, lookback_days: u32) -> DayResponse {
    let key = date_key(date);
    let habits = active_habits(snapshot, date)
        .into_iter()
        .map(|habit| HabitView {
            id: habit.id.clone(),
            title: habit.title.clone(),
            created_at: habit.created_at.clone(),
            done: snapshot.is_habit_done(&key, &habit.id),
        })
        .collect();

    DayResponse {
        stats: day_stats(snapshot, date),
        streak: current_streak_within(snapshot, today(), lookback_days),
        habits,
        tasks: tasks_on(snapshot, date).into_iter().cloned().collect(),
        date: key,
    }
}

fn required_title(raw: &str) -> Result<&str, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    Ok(title)
}

async fn ensure_habit(state: &AppState, habit_id: &str) -> Result<(), AppError> {
    let snapshot = state.snapshot.lock().await;
    match snapshot.habit(habit_id) {
        Some(_) => Ok(()),
        None => Err(habit_not_found(habit_id)),
    }
}

async fn ensure_task(state: &AppState, task_id: &str) -> Result<(), AppError> {
    let snapshot = state.snapshot.lock().await;
    match snapshot.task(task_id) {
        Some(_) => Ok(()),
        None => Err(task_not_found(task_id)),
    }
}

fn habit_not_found(habit_id: &str) -> AppError {
    AppError::not_found(format!("habit {habit_id} not found"))
}

fn task_not_found(task_id: &str) -> AppError {
    AppError::not_found(format!("task {task_id} not found"))
}
