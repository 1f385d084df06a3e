//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes:
//! spawning loads, cancelling them, and emitting actions on the action
//! channel. The reducer itself never performs I/O.

use dossier_core::dispatch::Action;
use dossier_core::record::Collection;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Spawn one load task per collection.
    LoadStores { collections: Vec<Collection> },

    /// Cancel an in-flight task.
    CancelTask { token: CancellationToken },

    /// Send an action through the action channel.
    SendAction(Action),
}
