pub mod app;
pub mod config;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod mutations;
pub mod stats;
pub mod storage;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use stats::{current_streak, day_stats};
pub use storage::load_snapshot;
