//! Application state machine: navigation list, tabs and filter.
//!
//! Every transition takes the current [`BrowserState`] by reference and
//! returns a fresh one; records are shared, containers are never edited in
//! place. [`register_handlers`] wires the transitions onto a
//! [`DispatchRegistry`].
//!
//! ```text
//! adversaries loaded ──► visible = all sorted by name, first tab opened
//! OBJECT_VIEW(id)    ──► tabs[active] = adversary
//! TAB_ADD            ──► tabs.push(tabs[active])
//! TAB_REMOVE         ──► drop rightmost non-active tab
//! TAB_CHANGE(i)      ──► active = i
//! MENU_FILTER(text)  ──► visible = matches; single match is viewed
//! ```

use std::fmt;
use std::sync::Arc;

use crate::dispatch::{Action, ActionKind, DispatchRegistry};
use crate::projection::{ProjectionOptions, SkillRow, project_skills};
use crate::record::{Adversary, RecordId, Skill};
use crate::store::Snapshot;

/// Shared, immutable list of adversaries.
pub type AdversaryList = Arc<[Arc<Adversary>]>;

/// Transition failures. The state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// `OBJECT_VIEW` named an id that is not in the adversary collection.
    UnknownAdversary(RecordId),
    /// `TAB_CHANGE` pointed outside the open tabs.
    TabOutOfRange { index: usize, len: usize },
    /// `TAB_ADD` with no tab open to duplicate.
    NoActiveTab,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::UnknownAdversary(id) => write!(f, "no adversary with id '{id}'"),
            ActionError::TabOutOfRange { index, len } => {
                write!(f, "tab {index} does not exist ({len} open)")
            }
            ActionError::NoActiveTab => write!(f, "no tab is open"),
        }
    }
}

impl std::error::Error for ActionError {}

/// Registry type driving a [`BrowserState`].
pub type BrowserRegistry = DispatchRegistry<BrowserState, ActionError>;

/// Builds a registry with the browser's handler for every action kind.
pub fn registry() -> BrowserRegistry {
    let mut registry = DispatchRegistry::new();
    register_handlers(&mut registry);
    registry
}

/// Registers the browser transitions on `registry`.
pub fn register_handlers(registry: &mut BrowserRegistry) {
    for kind in ActionKind::ALL {
        registry.register(kind, |state: &mut BrowserState, action: &Action| {
            *state = state.apply(action)?;
            Ok(())
        });
    }
}

/// Selection, tab and filter state.
#[derive(Debug, Clone)]
pub struct BrowserState {
    all: AdversaryList,
    visible: Option<AdversaryList>,
    filter_text: String,
    open_tabs: Vec<Arc<Adversary>>,
    active_tab: usize,
    all_stores_loaded: bool,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserState {
    /// Startup state: nothing loaded, no tabs, no filter.
    pub fn new() -> Self {
        Self {
            all: Arc::from(Vec::new()),
            visible: None,
            filter_text: String::new(),
            open_tabs: Vec::new(),
            active_tab: 0,
            all_stores_loaded: false,
        }
    }

    // ------------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------------

    /// Every adversary, in source order.
    pub fn all_adversaries(&self) -> &[Arc<Adversary>] {
        &self.all
    }

    /// Navigation list, `None` until adversaries have loaded.
    pub fn visible_list(&self) -> Option<&[Arc<Adversary>]> {
        self.visible.as_deref()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn open_tabs(&self) -> &[Arc<Adversary>] {
        &self.open_tabs
    }

    pub fn active_tab_index(&self) -> usize {
        self.active_tab
    }

    /// Adversary shown in the active tab.
    pub fn active_adversary(&self) -> Option<&Arc<Adversary>> {
        self.open_tabs.get(self.active_tab)
    }

    pub fn all_stores_loaded(&self) -> bool {
        self.all_stores_loaded
    }

    pub fn adversary(&self, id: &RecordId) -> Option<&Arc<Adversary>> {
        self.all.iter().find(|adversary| &adversary.id == id)
    }

    /// Pairs every open tab with its projected skill rows.
    pub fn tab_views(
        &self,
        skills: &[Arc<Skill>],
        options: impl Fn(usize) -> ProjectionOptions,
    ) -> Vec<TabView> {
        self.open_tabs
            .iter()
            .enumerate()
            .map(|(index, adversary)| TabView {
                index,
                active: index == self.active_tab,
                skills: project_skills(adversary, skills, options(index)),
                adversary: Arc::clone(adversary),
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Store notifications
    // ------------------------------------------------------------------------

    /// Adversary store changed: sort the list and open the first tab.
    #[must_use]
    pub fn with_adversaries(&self, snapshot: &Snapshot<Adversary>) -> Self {
        let all = snapshot.shared_records();
        let mut sorted: Vec<Arc<Adversary>> = all.to_vec();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut next = self.clone();
        if next.open_tabs.is_empty()
            && let Some(first) = sorted.first()
        {
            next.open_tabs = vec![Arc::clone(first)];
            next.active_tab = 0;
        }
        next.visible = Some(sorted.into());
        next.all = all;
        next
    }

    /// Any store changed: refresh the loading flag.
    #[must_use]
    pub fn with_stores_loaded(&self, all_stores_loaded: bool) -> Self {
        Self {
            all_stores_loaded,
            ..self.clone()
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Applies one action.
    ///
    /// # Errors
    /// See [`ActionError`]; on error `self` is the state to keep.
    pub fn apply(&self, action: &Action) -> Result<Self, ActionError> {
        match action {
            Action::ObjectView(id) => self.view(id),
            Action::TabAdd => self.add_tab(),
            Action::TabRemove => Ok(self.remove_tab()),
            Action::TabChange(index) => self.change_tab(*index),
            Action::MenuFilter(text) => Ok(self.filter(text)),
        }
    }

    /// Shows the adversary with `id` in the active tab.
    ///
    /// With no tab open the adversary becomes the first tab.
    ///
    /// # Errors
    /// [`ActionError::UnknownAdversary`] when `id` is not loaded.
    pub fn view(&self, id: &RecordId) -> Result<Self, ActionError> {
        let adversary = self
            .adversary(id)
            .ok_or_else(|| ActionError::UnknownAdversary(id.clone()))?;
        Ok(self.show_in_active_tab(Arc::clone(adversary)))
    }

    fn show_in_active_tab(&self, adversary: Arc<Adversary>) -> Self {
        let mut open_tabs = self.open_tabs.clone();
        let mut active_tab = self.active_tab;
        if let Some(slot) = open_tabs.get_mut(active_tab) {
            *slot = adversary;
        } else {
            open_tabs = vec![adversary];
            active_tab = 0;
        }
        Self {
            open_tabs,
            active_tab,
            ..self.clone()
        }
    }

    /// Appends a copy of the active tab. The active index does not move.
    ///
    /// # Errors
    /// [`ActionError::NoActiveTab`] when no tab is open.
    pub fn add_tab(&self) -> Result<Self, ActionError> {
        let active = self.active_adversary().ok_or(ActionError::NoActiveTab)?;
        let mut open_tabs = self.open_tabs.clone();
        open_tabs.push(Arc::clone(active));
        Ok(Self {
            open_tabs,
            ..self.clone()
        })
    }

    /// Removes the rightmost tab that is not active.
    ///
    /// No-op with one tab or none.
    #[must_use]
    pub fn remove_tab(&self) -> Self {
        let Some(removed) = (0..self.open_tabs.len())
            .rev()
            .find(|index| *index != self.active_tab)
        else {
            return self.clone();
        };

        let mut open_tabs = self.open_tabs.clone();
        open_tabs.remove(removed);
        let active_tab = if removed < self.active_tab {
            self.active_tab - 1
        } else {
            self.active_tab
        };
        Self {
            open_tabs,
            active_tab,
            ..self.clone()
        }
    }

    /// Makes the tab at `index` active.
    ///
    /// # Errors
    /// [`ActionError::TabOutOfRange`] when `index` is not an open tab.
    pub fn change_tab(&self, index: usize) -> Result<Self, ActionError> {
        if index >= self.open_tabs.len() {
            return Err(ActionError::TabOutOfRange {
                index,
                len: self.open_tabs.len(),
            });
        }
        Ok(Self {
            active_tab: index,
            ..self.clone()
        })
    }

    /// Filters the navigation list by name or tag.
    ///
    /// The name match ignores case. Tags are matched as written against the
    /// lowercased filter. An empty filter restores the full list in source
    /// order. A filter with exactly one match shows it in the active tab.
    #[must_use]
    pub fn filter(&self, text: &str) -> Self {
        let base = Self {
            filter_text: text.to_string(),
            ..self.clone()
        };

        if text.is_empty() {
            return Self {
                visible: Some(Arc::clone(&self.all)),
                ..base
            };
        }

        let needle = text.to_lowercase();
        let matches: Vec<Arc<Adversary>> = self
            .all
            .iter()
            .filter(|adversary| {
                adversary.name.to_lowercase().contains(&needle)
                    || adversary.joined_tags().contains(&needle)
            })
            .cloned()
            .collect();

        let single = match matches.as_slice() {
            [only] => Some(Arc::clone(only)),
            _ => None,
        };
        let filtered = Self {
            visible: Some(matches.into()),
            ..base
        };
        match single {
            Some(adversary) => filtered.show_in_active_tab(adversary),
            None => filtered,
        }
    }
}

/// One open tab ready for rendering.
#[derive(Debug, Clone)]
pub struct TabView {
    pub index: usize,
    pub active: bool,
    pub adversary: Arc<Adversary>,
    pub skills: Vec<SkillRow>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::Collection;
    use crate::store::RecordStore;

    fn adversary(id: &str, name: &str, tags: &[&str]) -> Arc<Adversary> {
        Arc::new(
            serde_json::from_value(json!({
                "id": id,
                "name": name,
                "type": "Rival",
                "tags": tags,
            }))
            .unwrap(),
        )
    }

    fn roster() -> Vec<Arc<Adversary>> {
        vec![
            adversary("st", "Stormtrooper", &["empire", "soldier"]),
            adversary("bh", "Bounty Hunter", &["underworld"]),
            adversary("ad", "Aqualish Thug", &["underworld", "alien"]),
        ]
    }

    fn loaded_state() -> BrowserState {
        let state = BrowserState::new();
        BrowserState {
            all: roster().into(),
            ..state
        }
        .with_adversaries_list()
    }

    impl BrowserState {
        fn with_adversaries_list(&self) -> Self {
            let mut sorted = self.all.to_vec();
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            Self {
                visible: Some(sorted.clone().into()),
                open_tabs: vec![Arc::clone(&sorted[0])],
                active_tab: 0,
                ..self.clone()
            }
        }

        fn with_tabs(&self, ids: &[&str], active: usize) -> Self {
            let open_tabs = ids
                .iter()
                .map(|id| Arc::clone(self.adversary(&RecordId::from(*id)).unwrap()))
                .collect();
            Self {
                open_tabs,
                active_tab: active,
                ..self.clone()
            }
        }

        fn tab_ids(&self) -> Vec<&str> {
            self.open_tabs.iter().map(|a| a.id.as_str()).collect()
        }

        fn visible_ids(&self) -> Vec<&str> {
            self.visible_list()
                .unwrap()
                .iter()
                .map(|a| a.id.as_str())
                .collect()
        }
    }

    #[tokio::test]
    async fn test_initial_load_sorts_and_opens_first_tab() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("adversaries.json"),
            r#"[{"id": "st", "name": "Stormtrooper"}, {"id": "ad", "name": "Aqualish Thug"}]"#,
        )
        .unwrap();
        let store = RecordStore::<Adversary>::new(Collection::Adversaries);
        store
            .load(&crate::source::DataSource::directory(dir.path()))
            .await
            .unwrap();

        let state = BrowserState::new();
        assert!(state.visible_list().is_none());

        let state = state.with_adversaries(&store.snapshot());

        assert_eq!(state.visible_ids(), vec!["ad", "st"]);
        assert_eq!(state.tab_ids(), vec!["ad"]);
        assert_eq!(state.active_tab_index(), 0);
        // Source order is untouched.
        assert_eq!(state.all_adversaries()[0].id.as_str(), "st");
    }

    #[test]
    fn test_reload_keeps_existing_tabs() {
        let state = loaded_state().with_tabs(&["st"], 0);
        let next = state.with_adversaries(&Snapshot::empty());
        assert_eq!(next.tab_ids(), vec!["st"]);
        assert!(next.visible_ids().is_empty());
    }

    #[test]
    fn test_view_replaces_active_tab() {
        let state = loaded_state().with_tabs(&["st", "bh"], 1);

        let next = state.view(&RecordId::from("ad")).unwrap();

        assert_eq!(next.tab_ids(), vec!["st", "ad"]);
        assert_eq!(next.active_tab_index(), 1);
        // Previous snapshot is untouched.
        assert_eq!(state.tab_ids(), vec!["st", "bh"]);
    }

    #[test]
    fn test_view_unknown_id_is_error() {
        let state = loaded_state();
        let err = state.view(&RecordId::from("nope")).unwrap_err();
        assert_eq!(err, ActionError::UnknownAdversary(RecordId::from("nope")));
    }

    #[test]
    fn test_view_without_tabs_opens_first() {
        let state = loaded_state().with_tabs(&[], 0);
        let next = state.view(&RecordId::from("bh")).unwrap();
        assert_eq!(next.tab_ids(), vec!["bh"]);
        assert_eq!(next.active_tab_index(), 0);
    }

    #[test]
    fn test_add_duplicates_active_tab() {
        let state = loaded_state().with_tabs(&["st", "bh"], 0);

        let next = state.add_tab().unwrap();

        assert_eq!(next.tab_ids(), vec!["st", "bh", "st"]);
        assert_eq!(next.active_tab_index(), 0);
        assert!(Arc::ptr_eq(&next.open_tabs()[0], &next.open_tabs()[2]));
    }

    #[test]
    fn test_add_without_tabs_is_error() {
        let state = loaded_state().with_tabs(&[], 0);
        assert_eq!(state.add_tab().unwrap_err(), ActionError::NoActiveTab);
    }

    #[test]
    fn test_remove_rightmost_when_active_is_left() {
        let state = loaded_state().with_tabs(&["st", "bh", "ad"], 1);

        let next = state.remove_tab();

        assert_eq!(next.tab_ids(), vec!["st", "bh"]);
        assert_eq!(next.active_tab_index(), 1);
    }

    #[test]
    fn test_remove_skips_active_rightmost_tab() {
        let state = loaded_state().with_tabs(&["st", "bh", "ad"], 2);

        let next = state.remove_tab();

        assert_eq!(next.tab_ids(), vec!["st", "ad"]);
        assert_eq!(next.active_tab_index(), 1);
    }

    #[test]
    fn test_remove_single_tab_is_noop() {
        let state = loaded_state();
        let next = state.remove_tab();
        assert_eq!(next.tab_ids(), state.tab_ids());
    }

    #[test]
    fn test_remove_never_drops_active_tab() {
        for active in 0..4 {
            let mut state = loaded_state().with_tabs(&["st", "bh", "ad", "bh"], active);
            let active_id = state.active_adversary().unwrap().id.clone();
            for _ in 0..5 {
                state = state.remove_tab();
                assert!(state.active_tab_index() < state.open_tabs().len());
                assert_eq!(state.active_adversary().unwrap().id, active_id);
            }
            assert_eq!(state.open_tabs().len(), 1);
        }
    }

    #[test]
    fn test_add_then_remove_restores_tabs() {
        let state = loaded_state().with_tabs(&["st", "bh"], 0);
        let next = state.add_tab().unwrap().remove_tab();
        assert_eq!(next.tab_ids(), state.tab_ids());
        assert_eq!(next.active_tab_index(), state.active_tab_index());
    }

    #[test]
    fn test_change_tab_validates_index() {
        let state = loaded_state().with_tabs(&["st", "bh"], 0);

        assert_eq!(state.change_tab(1).unwrap().active_tab_index(), 1);
        assert_eq!(
            state.change_tab(2).unwrap_err(),
            ActionError::TabOutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        let state = loaded_state();
        let next = state.filter("TROOP");
        assert_eq!(next.visible_ids(), vec!["st"]);
        assert_eq!(next.filter_text(), "TROOP");
    }

    #[test]
    fn test_filter_matches_tags() {
        let state = loaded_state();
        let next = state.filter("underworld");
        assert_eq!(next.visible_ids(), vec!["bh", "ad"]);
        // Two matches: the active tab is left alone.
        assert_eq!(next.tab_ids(), state.tab_ids());
    }

    #[test]
    fn test_filter_tags_compare_against_lowercased_filter() {
        let state = BrowserState {
            all: vec![adversary("x", "Xeno", &["Alien"])].into(),
            ..BrowserState::new()
        };
        // "Alien" does not contain the lowercased needle "alien".
        assert!(state.filter("ALIEN").visible_ids().is_empty());
        assert_eq!(state.filter("lien").visible_ids(), vec!["x"]);
        assert_eq!(state.filter("XEN").visible_ids(), vec!["x"]);
    }

    #[test]
    fn test_single_match_is_viewed_in_active_tab() {
        let state = loaded_state().with_tabs(&["st", "st"], 1);
        let next = state.filter("hunter");
        assert_eq!(next.visible_ids(), vec!["bh"]);
        assert_eq!(next.tab_ids(), vec!["st", "bh"]);
    }

    #[test]
    fn test_empty_filter_restores_source_order() {
        let state = loaded_state();
        let next = state.filter("under").filter("");
        assert_eq!(next.visible_ids(), vec!["st", "bh", "ad"]);
        assert_eq!(next.filter_text(), "");
    }

    #[test]
    fn test_registry_drives_state() {
        let registry = registry();
        let mut state = loaded_state();

        registry.dispatch(&mut state, &Action::TabAdd).unwrap();
        registry
            .dispatch(&mut state, &Action::ObjectView(RecordId::from("st")))
            .unwrap();
        registry.dispatch(&mut state, &Action::TabChange(1)).unwrap();
        assert_eq!(state.tab_ids(), vec!["st", "ad"]);
        assert_eq!(state.active_tab_index(), 1);

        let before = state.clone();
        let err = registry
            .dispatch(&mut state, &Action::TabChange(9))
            .unwrap_err();
        assert!(matches!(err, ActionError::TabOutOfRange { .. }));
        assert_eq!(state.tab_ids(), before.tab_ids());
        assert_eq!(state.active_tab_index(), before.active_tab_index());
    }

    #[test]
    fn test_tab_views_project_each_tab() {
        let skill: Arc<Skill> = Arc::new(
            serde_json::from_value(json!({"id": "cool", "name": "Cool", "characteristic": "Presence"}))
                .unwrap(),
        );
        let state = loaded_state().with_tabs(&["st", "bh"], 1);

        let views = state.tab_views(&[skill], |_| ProjectionOptions {
            show_all: true,
            minions: 1,
        });

        assert_eq!(views.len(), 2);
        assert!(!views[0].active);
        assert!(views[1].active);
        assert_eq!(views[1].adversary.id.as_str(), "bh");
        assert_eq!(views[1].skills.len(), 1);
    }
}
