//! Action dispatch.
//!
//! User interaction is expressed as [`Action`]s. The view sends them through
//! an [`ActionSender`]; the application root owns the matching
//! [`ActionReceiver`] and feeds each action to a [`DispatchRegistry`], one at a
//! time, so every handler runs to completion before the next action starts.
//!
//! Handlers only get `&mut S` and the action, so a handler cannot dispatch
//! while it is running.

use std::fmt;

use enum_map::{Enum, EnumMap};
use tokio::sync::mpsc;

use crate::record::RecordId;

/// Action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum ActionKind {
    ObjectView,
    TabAdd,
    TabRemove,
    TabChange,
    MenuFilter,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::ObjectView,
        ActionKind::TabAdd,
        ActionKind::TabRemove,
        ActionKind::TabChange,
        ActionKind::MenuFilter,
    ];

    /// Wire identifier of the action.
    pub fn identifier(self) -> &'static str {
        match self {
            ActionKind::ObjectView => "OBJECT_VIEW",
            ActionKind::TabAdd => "TAB_ADD",
            ActionKind::TabRemove => "TAB_REMOVE",
            ActionKind::TabChange => "TAB_CHANGE",
            ActionKind::MenuFilter => "MENU_FILTER",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == identifier)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A user-triggered state transition with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show an adversary in the active tab.
    ObjectView(RecordId),
    /// Duplicate the active tab.
    TabAdd,
    /// Close the rightmost tab that is not active.
    TabRemove,
    /// Make the tab at this index active.
    TabChange(usize),
    /// Filter the navigation list.
    MenuFilter(String),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ObjectView(_) => ActionKind::ObjectView,
            Action::TabAdd => ActionKind::TabAdd,
            Action::TabRemove => ActionKind::TabRemove,
            Action::TabChange(_) => ActionKind::TabChange,
            Action::MenuFilter(_) => ActionKind::MenuFilter,
        }
    }
}

/// A registered action handler.
pub type Handler<S, E> = Box<dyn Fn(&mut S, &Action) -> Result<(), E> + Send + Sync>;

/// Maps action kinds to ordered handler lists.
pub struct DispatchRegistry<S, E> {
    handlers: EnumMap<ActionKind, Vec<Handler<S, E>>>,
}

impl<S, E> Default for DispatchRegistry<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> fmt::Debug for DispatchRegistry<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, handlers) in &self.handlers {
            map.entry(&kind, &handlers.len());
        }
        map.finish()
    }
}

impl<S, E> DispatchRegistry<S, E> {
    pub fn new() -> Self {
        Self {
            handlers: EnumMap::from_fn(|_| Vec::new()),
        }
    }

    /// Appends `handler` to the list for `kind`.
    pub fn register<F>(&mut self, kind: ActionKind, handler: F)
    where
        F: Fn(&mut S, &Action) -> Result<(), E> + Send + Sync + 'static,
    {
        self.handlers[kind].push(Box::new(handler));
    }

    pub fn handler_count(&self, kind: ActionKind) -> usize {
        self.handlers[kind].len()
    }

    /// Runs every handler for the action's kind, in registration order.
    ///
    /// Returns how many handlers ran.
    ///
    /// # Errors
    /// The first handler error stops the dispatch; remaining handlers for
    /// this action do not run.
    pub fn dispatch(&self, state: &mut S, action: &Action) -> Result<usize, E> {
        let handlers = &self.handlers[action.kind()];
        tracing::debug!(action = %action.kind(), handlers = handlers.len(), "dispatch");
        for handler in handlers {
            handler(state, action)?;
        }
        Ok(handlers.len())
    }
}

/// Creates the action channel between the view and the application root.
pub fn action_channel() -> (ActionSender, ActionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ActionSender(tx), ActionReceiver(rx))
}

/// View-side handle for emitting actions.
#[derive(Debug, Clone)]
pub struct ActionSender(mpsc::UnboundedSender<Action>);

impl ActionSender {
    /// Queues an action. Returns false once the receiver is gone.
    pub fn send(&self, action: Action) -> bool {
        self.0.send(action).is_ok()
    }
}

/// Root-side end of the action channel.
#[derive(Debug)]
pub struct ActionReceiver(mpsc::UnboundedReceiver<Action>);

impl ActionReceiver {
    /// Takes every queued action without waiting.
    pub fn drain(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = self.0.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Waits for the next action. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<Action> {
        self.0.recv().await
    }
}
