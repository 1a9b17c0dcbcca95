use super::store::HistoryStore;

/// Looks up live actions for history entries.
pub trait ActionResolver {
    type Action;

    fn find_action(&self, action_name: &str) -> Option<Self::Action>;

    fn is_visible(&self, action: &Self::Action) -> bool;

    /// Whether the action can currently be activated.
    fn is_sensitive(&self, _action: &Self::Action) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Entries past this rank are never searched.
    pub max_items: usize,
    pub show_unavailable: bool,
}

/// Returns resolved actions whose entry matches `predicate`, best ranked first.
pub fn search_history<R, P>(
    store: &HistoryStore,
    resolver: &R,
    options: SearchOptions,
    keyword: &str,
    mut predicate: P,
) -> Vec<R::Action>
where
    R: ActionResolver,
    P: FnMut(&R::Action, &str) -> bool,
{
    store
        .iter()
        .take(options.max_items)
        .filter_map(|item| resolver.find_action(item.action_name()))
        .filter(|action| resolver.is_visible(action))
        .filter(|action| options.show_unavailable || resolver.is_sensitive(action))
        .filter(|action| predicate(action, keyword))
        .collect()
}
