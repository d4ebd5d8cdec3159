use crate::stats::STREAK_LOOKBACK_DAYS;
use crate::storage::resolve_data_path;
use std::{env, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub streak_lookback_days: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(8080),
            data_path: resolve_data_path(),
            streak_lookback_days: parse_lookback(
                env::var("APP_STREAK_LOOKBACK_DAYS").ok().as_deref(),
            ),
        }
    }
}

fn parse_lookback(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return STREAK_LOOKBACK_DAYS;
    };
    match raw.trim().parse::<u32>() {
        Ok(days) if days > 0 => days,
        _ => {
            warn!(
                "ignoring invalid APP_STREAK_LOOKBACK_DAYS={raw:?}, using {STREAK_LOOKBACK_DAYS}"
            );
            STREAK_LOOKBACK_DAYS
        }
    }
}
