use crate::config::{clamp_history_size, AppConfig};
use crate::error::AppResult;
use crate::state::{StateMachine, TrackerEvent};
use crate::storage::HistoryStorage;

use super::policy::{self, GuiBlacklist, NoGuiBlacklist};
use super::search::{search_history, ActionResolver, SearchOptions};
use super::store::{HistoryItem, HistoryStore};

/// Ranks the actions a user triggers so command search can surface the most
/// used ones first.
///
/// Owned by the host's top-level context. Every operation other than
/// [`ActionHistory::init`] is a silent no-op until the tracker is initialized.
/// Hosts touching it from several threads wrap it in a `Mutex`.
pub struct ActionHistory {
    store: HistoryStore,
    lifecycle: StateMachine,
    config: AppConfig,
    storage: HistoryStorage,
    gui_blacklist: Box<dyn GuiBlacklist>,
}

impl ActionHistory {
    pub fn new(config: AppConfig, storage: HistoryStorage) -> Self {
        Self {
            store: HistoryStore::new(),
            lifecycle: StateMachine::new(),
            config: config.normalized(),
            storage,
            gui_blacklist: Box::new(NoGuiBlacklist),
        }
    }

    pub fn with_gui_blacklist(mut self, gui_blacklist: impl GuiBlacklist + 'static) -> Self {
        self.gui_blacklist = Box::new(gui_blacklist);
        self
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &HistoryStorage {
        &self.storage
    }

    /// Loads the saved history. Calling it again while active only warns.
    pub fn init(&mut self) {
        if let Err(err) = self.lifecycle.transition(TrackerEvent::Init) {
            tracing::warn!(%err, "action history already initialized");
            return;
        }

        self.store.clear();
        let gui = &*self.gui_blacklist;
        match self
            .storage
            .load(&mut self.store, self.config.action_history_size, |name| {
                policy::is_excluded_action(name, gui)
            }) {
            Ok(loaded) => tracing::info!(loaded, "action history initialized"),
            Err(err) => {
                tracing::warn!(%err, "failed to load action history; starting empty");
                self.store.clear();
            }
        }
    }

    /// Saves and clears the history, then returns to the uninitialized state.
    ///
    /// A failed save still clears the history; the error is returned so the
    /// host can report it.
    pub fn exit(&mut self) -> AppResult<()> {
        if !self.is_active() {
            return Ok(());
        }

        let saved = self
            .storage
            .save(&self.store, self.config.action_history_size)
            .inspect_err(|err| tracing::warn!(%err, "failed to save action history"));
        self.store.clear();
        self.lifecycle.transition(TrackerEvent::Exit)?;
        tracing::info!("action history shut down");

        saved.map_err(Into::into)
    }

    pub fn clear(&mut self) {
        if self.is_active() {
            self.store.clear();
            tracing::debug!("action history cleared");
        }
    }

    /// Applies a new `action-history-size`. The stored history shrinks on the
    /// next activation; search and save honor the new size right away.
    pub fn set_history_size(&mut self, size: usize) {
        self.config.action_history_size = clamp_history_size(size);
    }

    pub fn set_search_show_unavailable(&mut self, show: bool) {
        self.config.search_show_unavailable_actions = show;
    }

    /// Counts one activation of `action_name`. Called for every triggered
    /// action.
    pub fn record_activation(&mut self, action_name: &str) {
        let max_len = self.config.action_history_size;
        if !self.is_active() || max_len == 0 || self.is_excluded_action(action_name) {
            return;
        }

        self.store.record(action_name, max_len);
        tracing::trace!(action = %action_name, "recorded action activation");
    }

    /// Resolved history actions matching `predicate`, best ranked first.
    pub fn search<R, P>(&self, resolver: &R, keyword: &str, predicate: P) -> Vec<R::Action>
    where
        R: ActionResolver,
        P: FnMut(&R::Action, &str) -> bool,
    {
        if !self.is_active() {
            return Vec::new();
        }
        let options = SearchOptions {
            max_items: self.config.action_history_size,
            show_unavailable: self.config.search_show_unavailable_actions,
        };
        search_history(&self.store, resolver, options, keyword, predicate)
    }

    pub fn is_blacklisted_action(&self, action_name: &str) -> bool {
        policy::is_blacklisted_action(action_name, &*self.gui_blacklist)
    }

    pub fn is_excluded_action(&self, action_name: &str) -> bool {
        policy::is_excluded_action(action_name, &*self.gui_blacklist)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, action_name: &str) -> Option<&HistoryItem> {
        self.store.get(action_name)
    }

    /// Ranked items, most used first. Empty while uninitialized.
    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> + '_ {
        self.store.iter()
    }
}

impl std::fmt::Debug for ActionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHistory")
            .field("state", &self.lifecycle.state())
            .field("len", &self.len())
            .field("config", &self.config)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
