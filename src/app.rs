use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/day", get(handlers::get_day))
        .route("/api/streak", get(handlers::get_streak))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/habits", post(handlers::create_habit))
        .route(
            "/api/habits/:id",
            put(handlers::rename_habit).delete(handlers::remove_habit),
        )
        .route("/api/habits/:id/toggle", post(handlers::toggle_habit))
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/api/tasks/:id",
            put(handlers::rename_task).delete(handlers::remove_task),
        )
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route(
            "/api/profile",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        .route("/api/export", get(handlers::export_data))
        .route("/api/import", post(handlers::import_data))
        .with_state(state)
}
