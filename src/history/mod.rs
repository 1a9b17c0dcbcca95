//! Frequency-ranked history of activated actions.

pub mod format;
pub mod policy;
pub mod search;
pub mod store;
mod tracker;

pub use format::HistoryRecord;
pub use policy::{is_blacklisted_action, is_excluded_action, GuiBlacklist, NoGuiBlacklist};
pub use search::{search_history, ActionResolver, SearchOptions};
pub use store::{max_delta, HistoryItem, HistoryStore, MAX_DELTA, MAX_DELTA_FALLOFF};
pub use tracker::ActionHistory;
