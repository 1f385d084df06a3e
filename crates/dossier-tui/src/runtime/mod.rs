//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! All side effects happen here. The reducer stays pure and produces
//! effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Load tasks and store watchers send `UiEvent`s to `inbox_tx`
//! - Actions emitted by the view go through the action channel
//! - Each frame the runtime drains both, then polls the terminal
//!
//! Events are applied one at a time, so every action handler finishes
//! before the next action is dispatched.

mod handlers;
mod inbox;

use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use dossier_core::dispatch::{ActionReceiver, ActionSender, action_channel};
use dossier_core::record::{Collection, Record};
use dossier_core::source::DataSource;
use dossier_core::store::{Catalog, RecordStore};
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick cadence while something is loading (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(50);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(250);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    source: DataSource,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    action_tx: ActionSender,
    action_rx: ActionReceiver,
    /// Parent of every task token; cancelled on drop.
    shutdown: CancellationToken,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Creates the runtime and takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(catalog: Arc<Catalog>, source: DataSource, show_all_default: bool) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = action_channel();

        Ok(Self {
            terminal,
            state: AppState::new(catalog, show_all_default),
            source,
            inbox_tx,
            inbox_rx,
            action_tx,
            action_rx,
            shutdown: CancellationToken::new(),
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop until quit.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        self.spawn_watchers();
        self.execute_effects(update::initial_effects());

        let mut dirty = true;
        while !self.state.should_quit {
            let events = self.collect_events()?;
            if !events.is_empty() {
                dirty = true;
            }
            for event in events {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
                if self.state.should_quit {
                    break;
                }
            }

            if dirty && !self.state.should_quit {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        tracing::info!("browser closed");
        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }
        events.extend(self.action_rx.drain().into_iter().map(UiEvent::Action));

        let loading = Collection::ALL
            .iter()
            .any(|c| self.state.loads.is_loading(*c));
        let tick_interval = if loading {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Don't block when there is already work to apply.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::LoadStores { collections } => {
                for collection in collections {
                    self.spawn_load(collection);
                }
            }
            UiEffect::CancelTask { token } => token.cancel(),
            UiEffect::SendAction(action) => {
                if !self.action_tx.send(action) {
                    tracing::warn!("action channel closed");
                }
            }
        }
    }

    /// Spawns a load task with a `LoadStarted`/`LoadFinished` lifecycle.
    fn spawn_load(&self, collection: Collection) {
        let cancel = self.shutdown.child_token();
        let tx = self.inbox_tx.clone();
        let _ = tx.send(UiEvent::LoadStarted {
            collection,
            cancel: cancel.clone(),
        });

        let catalog = Arc::clone(&self.state.catalog);
        let source = self.source.clone();
        tokio::spawn(async move {
            let result = handlers::load_collection(&catalog, collection, &source, cancel).await;
            let _ = tx.send(UiEvent::LoadFinished { collection, result });
        });
    }

    /// Subscribes to every store for the lifetime of the runtime.
    fn spawn_watchers(&self) {
        let catalog = Arc::clone(&self.state.catalog);
        self.spawn_watcher(&catalog.skills);
        self.spawn_watcher(&catalog.adversaries);
        self.spawn_watcher(&catalog.weapons);
        self.spawn_watcher(&catalog.talents);
        self.spawn_watcher(&catalog.qualities);
    }

    fn spawn_watcher<T: Record>(&self, store: &RecordStore<T>) {
        tokio::spawn(handlers::watch_store(
            store.subscribe(),
            self.inbox_tx.clone(),
            self.shutdown.child_token(),
        ));
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.shutdown.cancel();
        let _ = terminal::restore_terminal();
    }
}
