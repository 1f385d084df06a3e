//! Record Stores: one asynchronously loaded collection each.
//!
//! A store is an observable snapshot. Subscribers see either the empty
//! pre-load snapshot or the fully loaded one, never anything in between, and
//! a subscriber that arrives after the load is notified right away.
//!
//! ## Load protocol
//!
//! - `load()` fetches at most once at a time; callers that race an in-flight
//!   fetch get [`LoadOutcome::AlreadyStarted`] and no second notification.
//! - Success replaces the snapshot atomically and marks the store loaded for
//!   the rest of the process. Later calls return [`LoadOutcome::AlreadyLoaded`].
//! - Failure (or a dropped load future) leaves the empty snapshot in place
//!   and re-arms the store so an explicit retry can fetch again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use tokio::sync::watch;

use crate::record::{Adversary, Collection, Entry, Record, Skill};
use crate::source::{DataSource, LoadError};

/// Immutable view of a store's contents.
#[derive(Debug)]
pub struct Snapshot<T> {
    records: Arc<[Arc<T>]>,
    loaded: bool,
}

impl<T> Snapshot<T> {
    pub(crate) fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            loaded: false,
        }
    }

    /// Records in source order.
    pub fn records(&self) -> &[Arc<T>] {
        &self.records
    }

    /// Shared handle to the record list (no copy).
    pub fn shared_records(&self) -> Arc<[Arc<T>]> {
        Arc::clone(&self.records)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            loaded: self.loaded,
        }
    }
}

/// Result of a [`RecordStore::load`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call fetched the collection and published `count` records.
    Loaded { count: usize },
    /// Another call is fetching; this one did nothing.
    AlreadyStarted,
    /// The store was loaded earlier; this one did nothing.
    AlreadyLoaded,
}

/// Owns one typed collection.
#[derive(Debug)]
pub struct RecordStore<T> {
    collection: Collection,
    state: watch::Sender<Snapshot<T>>,
    fetching: AtomicBool,
}

impl<T: Record> RecordStore<T> {
    pub fn new(collection: Collection) -> Self {
        let (state, _initial) = watch::channel(Snapshot::empty());
        Self {
            collection,
            state,
            fetching: AtomicBool::new(false),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.state.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    /// Registers a change subscriber.
    ///
    /// If the store is already loaded the subscription's first `changed()`
    /// resolves immediately with the loaded snapshot.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut rx = self.state.subscribe();
        if rx.borrow().loaded {
            rx.mark_changed();
        }
        Subscription {
            collection: self.collection,
            rx,
        }
    }

    /// Fetches the collection from `source` and publishes it.
    ///
    /// # Errors
    /// Returns the source's [`LoadError`]; the store stays unloaded.
    pub async fn load(&self, source: &DataSource) -> Result<LoadOutcome, LoadError> {
        if self.is_loaded() {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        if self.fetching.swap(true, Ordering::AcqRel) {
            return Ok(LoadOutcome::AlreadyStarted);
        }
        let guard = FetchGuard::new(&self.fetching);

        tracing::debug!(collection = %self.collection, source = %source.location(), "loading collection");
        let records = match source.fetch::<T>(self.collection).await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(collection = %self.collection, error = %err, "collection failed to load");
                return Err(err);
            }
        };

        let count = records.len();
        self.state.send_replace(Snapshot {
            records: records.into_iter().map(Arc::new).collect(),
            loaded: true,
        });
        guard.disarm();
        tracing::info!(collection = %self.collection, count, "collection loaded");

        Ok(LoadOutcome::Loaded { count })
    }
}

/// Resets the in-flight flag unless the fetch published a snapshot.
struct FetchGuard<'a> {
    fetching: &'a AtomicBool,
    armed: bool,
}

impl<'a> FetchGuard<'a> {
    fn new(fetching: &'a AtomicBool) -> Self {
        Self {
            fetching,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.fetching.store(false, Ordering::Release);
        }
    }
}

/// A change subscription on a [`RecordStore`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    collection: Collection,
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T> Subscription<T> {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Waits for the next change and returns the new snapshot.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Current snapshot without waiting.
    pub fn current(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Stops receiving notifications.
    pub fn unsubscribe(self) {}
}

/// The five Record Stores, created once at startup.
#[derive(Debug)]
pub struct Catalog {
    pub skills: RecordStore<Skill>,
    pub adversaries: RecordStore<Adversary>,
    pub weapons: RecordStore<Entry>,
    pub talents: RecordStore<Entry>,
    pub qualities: RecordStore<Entry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            skills: RecordStore::new(Collection::Skills),
            adversaries: RecordStore::new(Collection::Adversaries),
            weapons: RecordStore::new(Collection::Weapons),
            talents: RecordStore::new(Collection::Talents),
            qualities: RecordStore::new(Collection::Qualities),
        }
    }

    pub fn is_loaded(&self, collection: Collection) -> bool {
        match collection {
            Collection::Skills => self.skills.is_loaded(),
            Collection::Adversaries => self.adversaries.is_loaded(),
            Collection::Weapons => self.weapons.is_loaded(),
            Collection::Talents => self.talents.is_loaded(),
            Collection::Qualities => self.qualities.is_loaded(),
        }
    }

    /// True once every store has loaded.
    pub fn all_loaded(&self) -> bool {
        Collection::ALL.iter().all(|c| self.is_loaded(*c))
    }

    /// Number of records currently held by a store.
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Skills => self.skills.snapshot().len(),
            Collection::Adversaries => self.adversaries.snapshot().len(),
            Collection::Weapons => self.weapons.snapshot().len(),
            Collection::Talents => self.talents.snapshot().len(),
            Collection::Qualities => self.qualities.snapshot().len(),
        }
    }

    /// Loads one store.
    ///
    /// # Errors
    /// Returns the store's [`LoadError`].
    pub async fn load(
        &self,
        collection: Collection,
        source: &DataSource,
    ) -> Result<LoadOutcome, LoadError> {
        match collection {
            Collection::Skills => self.skills.load(source).await,
            Collection::Adversaries => self.adversaries.load(source).await,
            Collection::Weapons => self.weapons.load(source).await,
            Collection::Talents => self.talents.load(source).await,
            Collection::Qualities => self.qualities.load(source).await,
        }
    }

    /// Loads every store concurrently. No ordering across collections.
    pub async fn load_all(
        &self,
        source: &DataSource,
    ) -> Vec<(Collection, Result<LoadOutcome, LoadError>)> {
        join_all(Collection::ALL.map(|collection| async move {
            (collection, self.load(collection, source).await)
        }))
        .await
    }
}
