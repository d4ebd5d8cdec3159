use crate::errors::AppError;
use chrono::{Local, NaiveDate};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` key used for every date-keyed lookup.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a date key, rejecting anything that is not already canonical
/// (e.g. `2024-1-5` or surrounding whitespace).
pub fn parse_date_key(raw: &str) -> Result<NaiveDate, AppError> {
    let date = NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT)
        .map_err(|_| AppError::bad_request(format!("invalid date '{raw}', expected YYYY-MM-DD")))?;
    if date_key(date) != raw {
        return Err(AppError::bad_request(format!(
            "invalid date '{raw}', expected YYYY-MM-DD"
        )));
    }
    Ok(date)
}

pub fn is_date_key(raw: &str) -> bool {
    parse_date_key(raw).is_ok()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves an optional `date` parameter, defaulting to today.
pub fn date_or_today(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw {
        Some(raw) => parse_date_key(raw),
        None => Ok(today()),
    }
}
