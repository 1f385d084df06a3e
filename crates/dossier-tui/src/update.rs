//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dossier_core::dispatch::Action;
use dossier_core::projection::MAX_MINIONS;
use dossier_core::record::Collection;
use dossier_core::store::LoadOutcome;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;

/// Effects to run once at startup: load every store.
pub fn initial_effects() -> Vec<UiEffect> {
    vec![UiEffect::LoadStores {
        collections: Collection::ALL.to_vec(),
    }]
}

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Action(action) => {
            handle_action(app, &action);
            vec![]
        }
        UiEvent::LoadStarted { collection, cancel } => {
            app.loads.in_flight[collection] = Some(cancel);
            vec![]
        }
        UiEvent::LoadFinished { collection, result } => {
            app.loads.in_flight[collection] = None;
            match result {
                Ok(LoadOutcome::Loaded { .. } | LoadOutcome::AlreadyLoaded) => {
                    app.loads.failed[collection] = None;
                }
                Ok(LoadOutcome::AlreadyStarted) => {}
                Err(err) => {
                    app.status = Some(err.to_string());
                    app.loads.failed[collection] = Some(err);
                }
            }
            vec![]
        }
        UiEvent::StoreChanged(collection) => {
            if collection == Collection::Adversaries {
                let snapshot = app.catalog.adversaries.snapshot();
                app.browser = app.browser.with_adversaries(&snapshot);
                app.reconcile_panels();
                app.clamp_cursor();
            }
            app.browser = app
                .browser
                .with_stores_loaded(app.catalog.all_loaded());
            vec![]
        }
    }
}

/// Runs an action through the registry and commits the result.
///
/// On error the previous state stays and the error goes to the status bar.
fn handle_action(app: &mut AppState, action: &Action) {
    let mut next = app.browser.clone();
    match app.registry.dispatch(&mut next, action) {
        Ok(_) => {
            app.browser = next;
            app.status = None;
            app.reconcile_panels();
            app.clamp_cursor();
        }
        Err(err) => {
            tracing::debug!(action = %action.kind(), error = %err, "action rejected");
            app.status = Some(err.to_string());
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return quit(app);
    }

    if app.filter.editing {
        return handle_filter_key(app, key);
    }

    match key.code {
        KeyCode::Char('q') => quit(app),
        KeyCode::Up | KeyCode::Char('k') => {
            app.list.cursor = app.list.cursor.saturating_sub(1);
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.list.cursor = app.list.cursor.saturating_add(1);
            app.clamp_cursor();
            vec![]
        }
        KeyCode::Enter => app
            .selected_id()
            .map(|id| vec![UiEffect::SendAction(Action::ObjectView(id.clone()))])
            .unwrap_or_default(),
        KeyCode::Char('/') => {
            app.filter.editing = true;
            vec![]
        }
        KeyCode::Char('a') => vec![UiEffect::SendAction(Action::TabAdd)],
        KeyCode::Char('x') => vec![UiEffect::SendAction(Action::TabRemove)],
        KeyCode::Tab => cycle_tab(app, 1),
        KeyCode::BackTab => cycle_tab(app, -1),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            vec![UiEffect::SendAction(Action::TabChange(index))]
        }
        KeyCode::Char('s') => {
            if let Some(panel) = app.active_panel_mut() {
                panel.show_all = !panel.show_all;
            }
            vec![]
        }
        KeyCode::Char('+') => {
            if let Some(panel) = app.active_panel_mut() {
                panel.minions = (panel.minions + 1).min(MAX_MINIONS);
            }
            vec![]
        }
        KeyCode::Char('-') => {
            if let Some(panel) = app.active_panel_mut() {
                panel.minions = panel.minions.saturating_sub(1).max(1);
            }
            vec![]
        }
        KeyCode::Char('=') => {
            if let Some(panel) = app.active_panel_mut() {
                panel.minions = 1;
            }
            vec![]
        }
        KeyCode::Char('r') => retry_failed_loads(app),
        _ => vec![],
    }
}

fn handle_filter_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.filter.editing = false;
            vec![]
        }
        KeyCode::Backspace => {
            if app.filter.text.pop().is_some() {
                vec![UiEffect::SendAction(Action::MenuFilter(
                    app.filter.text.clone(),
                ))]
            } else {
                vec![]
            }
        }
        KeyCode::Char(c) => {
            app.filter.text.push(c);
            vec![UiEffect::SendAction(Action::MenuFilter(
                app.filter.text.clone(),
            ))]
        }
        _ => vec![],
    }
}

fn cycle_tab(app: &AppState, step: isize) -> Vec<UiEffect> {
    let len = app.browser.open_tabs().len();
    if len < 2 {
        return vec![];
    }
    let current = app.browser.active_tab_index();
    let next = if step < 0 {
        (current + len - 1) % len
    } else {
        (current + 1) % len
    };
    vec![UiEffect::SendAction(Action::TabChange(next))]
}

fn retry_failed_loads(app: &mut AppState) -> Vec<UiEffect> {
    let collections: Vec<Collection> = app
        .loads
        .failed_collections()
        .into_iter()
        .filter(|c| !app.loads.is_loading(*c))
        .collect();
    if collections.is_empty() {
        return vec![];
    }
    for collection in &collections {
        app.loads.failed[*collection] = None;
    }
    app.status = None;
    vec![UiEffect::LoadStores { collections }]
}

fn quit(app: &AppState) -> Vec<UiEffect> {
    let mut effects: Vec<UiEffect> = app
        .loads
        .cancel_tokens()
        .into_iter()
        .map(|token| UiEffect::CancelTask { token })
        .collect();
    effects.push(UiEffect::Quit);
    effects
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use dossier_core::record::RecordId;
    use dossier_core::source::{DataSource, LoadError, LoadErrorKind};
    use dossier_core::store::Catalog;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn write_fixture(dir: &TempDir) {
        let files = [
            (
                "skills.json",
                json!([
                    {"id": "athletics", "name": "Athletics", "characteristic": "Brawn"},
                    {"id": "cool", "name": "Cool", "characteristic": "Presence"}
                ]),
            ),
            (
                "adversaries.json",
                json!([
                    {"id": "trooper", "name": "Trooper", "type": "Minion",
                     "tags": ["empire"], "characteristics": {"Brawn": 2, "Presence": 1},
                     "skills": {"Athletics": 1}},
                    {"id": "agent", "name": "Agent", "type": "Rival",
                     "tags": ["empire", "spy"], "characteristics": {"Presence": 3},
                     "skills": {"Cool": 2}},
                    {"id": "bounty", "name": "Bounty Hunter", "type": "Nemesis"}
                ]),
            ),
            ("weapons.json", json!([])),
            ("talents.json", json!([])),
            ("qualities.json", json!([])),
        ];
        for (name, value) in files {
            fs::write(dir.path().join(name), value.to_string()).unwrap();
        }
    }

    async fn loaded_app() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir);
        let catalog = Arc::new(Catalog::new());
        for (_, result) in catalog.load_all(&DataSource::directory(dir.path())).await {
            result.unwrap();
        }

        let mut app = AppState::new(catalog, false);
        for collection in Collection::ALL {
            update(&mut app, UiEvent::StoreChanged(collection));
        }
        app
    }

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    /// Feeds every `SendAction` effect back as an action event, like the runtime.
    fn run(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
        let mut rest = Vec::new();
        for effect in update(app, event) {
            match effect {
                UiEffect::SendAction(action) => {
                    rest.extend(update(app, UiEvent::Action(action)));
                }
                other => rest.push(other),
            }
        }
        rest
    }

    fn tab_ids(app: &AppState) -> Vec<&str> {
        app.browser
            .open_tabs()
            .iter()
            .map(|a| a.id.as_str())
            .collect()
    }

    #[test]
    fn test_initial_effects_load_every_store() {
        let effects = initial_effects();
        assert!(matches!(
            &effects[..],
            [UiEffect::LoadStores { collections }] if collections.len() == Collection::ALL.len()
        ));
    }

    #[tokio::test]
    async fn test_store_changes_open_first_tab() {
        let app = loaded_app().await;

        assert!(app.browser.all_stores_loaded());
        // Sorted by name: Agent, Bounty Hunter, Trooper
        assert_eq!(tab_ids(&app), vec!["agent"]);
        assert_eq!(app.panels.len(), 1);
        assert_eq!(app.panels[0].minions, 1);
    }

    #[tokio::test]
    async fn test_enter_views_selected_adversary() {
        let mut app = loaded_app().await;

        run(&mut app, key(KeyCode::Down));
        run(&mut app, key(KeyCode::Down));
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(matches!(
            &effects[..],
            [UiEffect::SendAction(Action::ObjectView(id))] if id == &RecordId::from("trooper")
        ));

        run(&mut app, key(KeyCode::Enter));
        assert_eq!(tab_ids(&app), vec!["trooper"]);
    }

    #[tokio::test]
    async fn test_cursor_stays_in_list() {
        let mut app = loaded_app().await;
        for _ in 0..10 {
            run(&mut app, key(KeyCode::Down));
        }
        assert_eq!(app.list.cursor, 2);
        for _ in 0..10 {
            run(&mut app, key(KeyCode::Up));
        }
        assert_eq!(app.list.cursor, 0);
    }

    #[tokio::test]
    async fn test_filter_typing_filters_live_and_auto_views() {
        let mut app = loaded_app().await;

        run(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter.editing);
        for c in "spy".chars() {
            run(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.browser.filter_text(), "spy");
        assert_eq!(app.browser.visible_list().unwrap().len(), 1);
        assert_eq!(tab_ids(&app), vec!["agent"]);

        run(&mut app, key(KeyCode::Esc));
        assert!(!app.filter.editing);

        run(&mut app, key(KeyCode::Char('/')));
        for _ in 0..3 {
            run(&mut app, key(KeyCode::Backspace));
        }
        assert_eq!(app.browser.filter_text(), "");
        assert_eq!(app.browser.visible_list().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tab_keys() {
        let mut app = loaded_app().await;

        run(&mut app, key(KeyCode::Char('a')));
        run(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.browser.open_tabs().len(), 3);
        assert_eq!(app.panels.len(), 3);

        run(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.browser.active_tab_index(), 2);
        run(&mut app, key(KeyCode::Tab));
        assert_eq!(app.browser.active_tab_index(), 0);
        run(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.browser.active_tab_index(), 2);

        run(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.browser.open_tabs().len(), 2);
        assert_eq!(app.browser.active_tab_index(), 1);
        assert_eq!(app.panels.len(), 2);
    }

    #[tokio::test]
    async fn test_minion_group_stops_at_max() {
        let mut app = loaded_app().await;
        app.panels[0].minions = MAX_MINIONS - 1;

        run(&mut app, key(KeyCode::Char('+')));
        run(&mut app, key(KeyCode::Char('+')));

        assert_eq!(app.panels[0].minions, MAX_MINIONS);
    }

    #[tokio::test]
    async fn test_out_of_range_tab_reports_error() {
        let mut app = loaded_app().await;

        run(&mut app, key(KeyCode::Char('5')));

        assert_eq!(app.browser.active_tab_index(), 0);
        assert_eq!(app.status.as_deref(), Some("tab 4 does not exist (1 open)"));
    }

    #[tokio::test]
    async fn test_panel_toggles_reset_when_tab_changes_adversary() {
        let mut app = loaded_app().await;

        run(&mut app, key(KeyCode::Char('s')));
        run(&mut app, key(KeyCode::Char('+')));
        run(&mut app, key(KeyCode::Char('+')));
        assert!(app.panels[0].show_all);
        assert_eq!(app.panels[0].minions, 3);

        run(&mut app, key(KeyCode::Char('=')));
        assert_eq!(app.panels[0].minions, 1);
        run(&mut app, key(KeyCode::Char('-')));
        assert_eq!(app.panels[0].minions, 1);

        run(&mut app, key(KeyCode::Char('+')));
        run(&mut app, UiEvent::Action(Action::ObjectView(RecordId::from("trooper"))));
        assert!(!app.panels[0].show_all);
        assert_eq!(app.panels[0].minions, 1);

        // Re-viewing the same adversary keeps the toggles.
        run(&mut app, key(KeyCode::Char('s')));
        run(&mut app, UiEvent::Action(Action::ObjectView(RecordId::from("trooper"))));
        assert!(app.panels[0].show_all);
    }

    #[tokio::test]
    async fn test_load_failure_then_retry() {
        let mut app = AppState::new(Arc::new(Catalog::new()), false);
        let token = CancellationToken::new();

        update(
            &mut app,
            UiEvent::LoadStarted {
                collection: Collection::Talents,
                cancel: token.clone(),
            },
        );
        assert!(app.loads.is_loading(Collection::Talents));

        update(
            &mut app,
            UiEvent::LoadFinished {
                collection: Collection::Talents,
                result: Err(LoadError::new(
                    Collection::Talents,
                    LoadErrorKind::Io("missing".to_string()),
                )),
            },
        );
        assert!(app.loads.has_errors());
        assert!(app.status.is_some());

        let effects = update(&mut app, key(KeyCode::Char('r')));
        assert!(matches!(
            &effects[..],
            [UiEffect::LoadStores { collections }] if collections == &vec![Collection::Talents]
        ));
        assert!(!app.loads.has_errors());

        // Nothing left to retry.
        assert!(update(&mut app, key(KeyCode::Char('r'))).is_empty());
    }

    #[test]
    fn test_quit_cancels_in_flight_loads() {
        let mut app = AppState::new(Arc::new(Catalog::new()), false);
        let token = CancellationToken::new();
        update(
            &mut app,
            UiEvent::LoadStarted {
                collection: Collection::Skills,
                cancel: token.clone(),
            },
        );

        let effects = update(&mut app, key(KeyCode::Char('q')));

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], UiEffect::CancelTask { .. }));
        assert!(matches!(effects[1], UiEffect::Quit));
    }

    #[test]
    fn test_ctrl_c_quits_while_editing_filter() {
        let mut app = AppState::new(Arc::new(Catalog::new()), false);
        app.filter.editing = true;

        let effects = update(
            &mut app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
            ))),
        );

        assert!(matches!(&effects[..], [UiEffect::Quit]));
    }
}
