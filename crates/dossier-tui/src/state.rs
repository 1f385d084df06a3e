//! Application state composition.
//!
//! ```text
//! AppState
//! ├── browser: BrowserState     (tabs, selection, filter; core state machine)
//! ├── registry: BrowserRegistry (action handlers)
//! ├── catalog: Arc<Catalog>     (the five record stores)
//! ├── panels: Vec<PanelState>   (per-tab skill panel toggles)
//! ├── list: ListState           (navigation cursor)
//! ├── filter: FilterInput       (filter editing)
//! └── loads: LoadState          (in-flight tasks and failures)
//! ```
//!
//! Only the reducer in `update.rs` mutates this.

use std::sync::Arc;

use dossier_core::browser::{self, BrowserRegistry, BrowserState};
use dossier_core::projection::ProjectionOptions;
use dossier_core::record::{Collection, RecordId};
use dossier_core::source::LoadError;
use dossier_core::store::Catalog;
use enum_map::EnumMap;
use tokio_util::sync::CancellationToken;

/// Skill panel toggles for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    /// Adversary the toggles belong to.
    pub adversary: RecordId,
    pub show_all: bool,
    /// Minion group size, never below 1.
    pub minions: u32,
}

impl PanelState {
    pub fn new(adversary: RecordId, show_all: bool) -> Self {
        Self {
            adversary,
            show_all,
            minions: 1,
        }
    }

    pub fn options(&self) -> ProjectionOptions {
        ProjectionOptions {
            show_all: self.show_all,
            minions: self.minions,
        }
    }
}

/// Navigation list cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListState {
    pub cursor: usize,
}

/// Filter box state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterInput {
    /// Keystrokes go to the filter box.
    pub editing: bool,
    pub text: String,
}

/// Store loading bookkeeping.
#[derive(Debug, Default)]
pub struct LoadState {
    pub in_flight: EnumMap<Collection, Option<CancellationToken>>,
    pub failed: EnumMap<Collection, Option<LoadError>>,
}

impl LoadState {
    pub fn is_loading(&self, collection: Collection) -> bool {
        self.in_flight[collection].is_some()
    }

    /// Collections whose last load failed.
    pub fn failed_collections(&self) -> Vec<Collection> {
        self.failed
            .iter()
            .filter_map(|(collection, err)| err.as_ref().map(|_| collection))
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &LoadError> {
        self.failed.values().flatten()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Tokens of every in-flight load.
    pub fn cancel_tokens(&self) -> Vec<CancellationToken> {
        self.in_flight.values().flatten().cloned().collect()
    }
}

/// Top-level TUI state.
pub struct AppState {
    pub browser: BrowserState,
    pub registry: BrowserRegistry,
    pub catalog: Arc<Catalog>,
    pub panels: Vec<PanelState>,
    pub list: ListState,
    pub filter: FilterInput,
    pub loads: LoadState,
    /// One-line message for the status bar (action errors, load results).
    pub status: Option<String>,
    /// Initial "show all" for new panels.
    pub show_all_default: bool,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, show_all_default: bool) -> Self {
        Self {
            browser: BrowserState::new(),
            registry: browser::registry(),
            catalog,
            panels: Vec::new(),
            list: ListState::default(),
            filter: FilterInput::default(),
            loads: LoadState::default(),
            status: None,
            show_all_default,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Panel toggles for the tab at `index`, defaulting when absent.
    pub fn panel_options(&self, index: usize) -> ProjectionOptions {
        self.panels
            .get(index)
            .map_or(
                ProjectionOptions {
                    show_all: self.show_all_default,
                    ..ProjectionOptions::default()
                },
                PanelState::options,
            )
    }

    pub fn active_panel_mut(&mut self) -> Option<&mut PanelState> {
        let index = self.browser.active_tab_index();
        self.panels.get_mut(index)
    }

    /// Realigns panel toggles with the open tabs.
    ///
    /// A tab whose adversary changed gets fresh toggles.
    pub fn reconcile_panels(&mut self) {
        let tabs = self.browser.open_tabs();
        self.panels.truncate(tabs.len());
        for (index, adversary) in tabs.iter().enumerate() {
            match self.panels.get_mut(index) {
                Some(panel) if panel.adversary == adversary.id => {}
                Some(panel) => *panel = PanelState::new(adversary.id.clone(), self.show_all_default),
                None => self
                    .panels
                    .push(PanelState::new(adversary.id.clone(), self.show_all_default)),
            }
        }
    }

    /// Keeps the list cursor inside the visible list.
    pub fn clamp_cursor(&mut self) {
        let len = self.browser.visible_list().map_or(0, <[_]>::len);
        self.list.cursor = self.list.cursor.min(len.saturating_sub(1));
    }

    /// The adversary under the list cursor.
    pub fn selected_id(&self) -> Option<&RecordId> {
        self.browser
            .visible_list()
            .and_then(|list| list.get(self.list.cursor))
            .map(|adversary| &adversary.id)
    }
}
