//! UI event types.
//!
//! Every input the reducer sees is a `UiEvent`: terminal input, timer ticks,
//! actions drained from the action channel, and results of async store work
//! delivered through the runtime inbox.
//!
//! ## Load lifecycle
//!
//! - The runtime emits `LoadStarted` once a load task is spawned, carrying
//!   the task's `CancellationToken`
//! - The task reports `LoadFinished` with the store's result
//! - Store watchers report `StoreChanged` whenever a store publishes a new
//!   snapshot (including the replay for an already loaded store)

use crossterm::event::Event as CrosstermEvent;
use dossier_core::dispatch::Action;
use dossier_core::record::Collection;
use dossier_core::source::LoadError;
use dossier_core::store::LoadOutcome;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic timer, drives redraws and the loading spinner.
    Tick,

    /// Raw terminal input.
    Terminal(CrosstermEvent),

    /// An action drained from the action channel.
    Action(Action),

    /// A load task was spawned for `collection`.
    LoadStarted {
        collection: Collection,
        cancel: CancellationToken,
    },

    /// A load task ended.
    LoadFinished {
        collection: Collection,
        result: Result<LoadOutcome, LoadError>,
    },

    /// A store published a new snapshot.
    StoreChanged(Collection),
}
