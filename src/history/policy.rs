//! Which actions may enter the history and which may show up in search.
//!
//! Search UI code outside the tracker consults the same predicates, so the
//! name patterns live here and nowhere else.

const BLACKLISTED_SUFFIXES: [&str; 2] = ["-set", "-accel"];
const BLACKLISTED_PREFIXES: [&str; 2] = ["context-", "filters-recent-"];
const BLACKLISTED_NAMES: [&str; 1] = ["dialogs-action-search"];

/// Actions that may be searched but are too generic to rank.
const HISTORY_ONLY_EXCLUSIONS: [&str; 6] = [
    "edit-undo",
    "edit-strong-undo",
    "edit-redo",
    "edit-strong-redo",
    "filters-repeat",
    "filters-reshow",
];

/// Host-provided check for actions the GUI layer hides from search.
pub trait GuiBlacklist: Send {
    fn is_gui_blacklisted(&self, action_name: &str) -> bool;
}

/// Blacklist that flags nothing, for hosts without a GUI-level list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGuiBlacklist;

impl GuiBlacklist for NoGuiBlacklist {
    fn is_gui_blacklisted(&self, _action_name: &str) -> bool {
        false
    }
}

impl<F> GuiBlacklist for F
where
    F: Fn(&str) -> bool + Send,
{
    fn is_gui_blacklisted(&self, action_name: &str) -> bool {
        self(action_name)
    }
}

/// Excluded from both the history and search results.
pub fn is_blacklisted_action(action_name: &str, gui: &dyn GuiBlacklist) -> bool {
    BLACKLISTED_SUFFIXES
        .iter()
        .any(|suffix| action_name.ends_with(suffix))
        || BLACKLISTED_PREFIXES
            .iter()
            .any(|prefix| action_name.starts_with(prefix))
        || BLACKLISTED_NAMES.contains(&action_name)
        || gui.is_gui_blacklisted(action_name)
}

/// Excluded from the history. Every blacklisted action is also excluded.
pub fn is_excluded_action(action_name: &str, gui: &dyn GuiBlacklist) -> bool {
    is_blacklisted_action(action_name, gui) || HISTORY_ONLY_EXCLUSIONS.contains(&action_name)
}
