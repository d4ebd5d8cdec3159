use crate::dates::is_date_key;
use crate::errors::AppError;
use crate::models::Snapshot;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, info};

const REQUIRED_FIELDS: [&str; 3] = ["user", "tasks", "habits"];

pub fn resolve_data_path() -> PathBuf {
    match env::var("APP_DATA_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from("data/state.json"),
    }
}

pub async fn load_snapshot(path: &Path) -> Snapshot {
    match fs::read(path).await {
        Ok(bytes) => match parse_snapshot(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!("failed to parse data file {}: {}", path.display(), err.message);
                Snapshot::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no data file at {}, starting fresh", path.display());
            Snapshot::default()
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            Snapshot::default()
        }
    }
}

/// Writes to a sibling `.tmp` file and renames it over `path`, so a crash
/// mid-write never leaves a truncated data file behind.
pub async fn persist_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(snapshot)?;
    let tmp_path = temp_sibling(path);
    fs::write(&tmp_path, payload).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

pub fn export_snapshot(snapshot: &Snapshot) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Validates an exported document before anything is applied: top-level
/// shape, field types, then every date key.
pub fn import_snapshot(text: &str) -> Result<Snapshot, AppError> {
    parse_snapshot(text.as_bytes())
}

fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot, AppError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|err| AppError::bad_request(format!("invalid JSON: {err}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| AppError::bad_request("expected a JSON object"))?;
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(AppError::bad_request(format!("missing required field '{field}'")));
        }
    }

    let snapshot: Snapshot = serde_json::from_value(value)
        .map_err(|err| AppError::bad_request(format!("invalid data: {err}")))?;
    validate_dates(&snapshot)?;
    Ok(snapshot)
}

fn validate_dates(snapshot: &Snapshot) -> Result<(), AppError> {
    if let Some(habit) = snapshot.habits.iter().find(|habit| !is_date_key(&habit.created_at)) {
        return Err(AppError::bad_request(format!(
            "habit '{}' has invalid created_at '{}'",
            habit.id, habit.created_at
        )));
    }
    if let Some(task) = snapshot.tasks.iter().find(|task| !is_date_key(&task.date)) {
        return Err(AppError::bad_request(format!(
            "task '{}' has invalid date '{}'",
            task.id, task.date
        )));
    }
    if let Some(key) = snapshot.habit_logs.keys().find(|key| !is_date_key(key)) {
        return Err(AppError::bad_request(format!("invalid log date '{key}'")));
    }
    Ok(())
}
