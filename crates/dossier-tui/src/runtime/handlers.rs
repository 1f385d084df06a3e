//! Async work spawned by the runtime.
//!
//! Handlers are plain async functions. The runtime spawns them and forwards
//! what they produce to the inbox.

use dossier_core::record::{Collection, Record};
use dossier_core::source::{DataSource, LoadError};
use dossier_core::store::{Catalog, LoadOutcome, Subscription};
use tokio_util::sync::CancellationToken;

use super::inbox::UiEventSender;
use crate::events::UiEvent;

/// Loads one store, giving up when `cancel` fires.
pub async fn load_collection(
    catalog: &Catalog,
    collection: Collection,
    source: &DataSource,
    cancel: CancellationToken,
) -> Result<LoadOutcome, LoadError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(%collection, "load cancelled");
            Err(LoadError::cancelled(collection))
        }
        result = catalog.load(collection, source) => result,
    }
}

/// Forwards store notifications to the inbox until the store goes away,
/// the inbox closes, or `cancel` fires.
pub async fn watch_store<T: Record>(
    mut subscription: Subscription<T>,
    tx: UiEventSender,
    cancel: CancellationToken,
) {
    let collection = subscription.collection();
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            changed = subscription.changed() => {
                if changed.is_none() || tx.send(UiEvent::StoreChanged(collection)).is_err() {
                    break;
                }
            }
        }
    }
    subscription.unsubscribe();
}
