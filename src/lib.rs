pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod state;
pub mod storage;

pub use config::{load_app_config, AppConfig};
pub use error::{AppError, AppResult};
pub use history::{
    is_blacklisted_action, is_excluded_action, ActionHistory, ActionResolver, GuiBlacklist,
    HistoryItem, HistoryStore, NoGuiBlacklist,
};
pub use storage::HistoryStorage;

/// Builds a tracker from the user's config and default history location, then
/// loads the saved history.
pub fn start() -> AppResult<ActionHistory> {
    logging::init();
    let config = load_app_config();
    let storage = HistoryStorage::with_default_path()?;
    tracing::info!(path = %storage.path().display(), "starting action history");

    let mut history = ActionHistory::new(config, storage);
    history.init();
    Ok(history)
}
