//! Core library for the Dossier adversary browser.
//!
//! Record stores, action dispatch, the browser state machine, skill
//! projection and loadout resolution. Frontends (TUI, CLI) build on top of this crate.

pub mod browser;
pub mod config;
pub mod dispatch;
pub mod loadout;
pub mod logging;
pub mod projection;
pub mod record;
pub mod source;
pub mod store;

pub use browser::{ActionError, BrowserState, TabView};
pub use dispatch::{Action, ActionKind, DispatchRegistry};
pub use loadout::Loadout;
pub use record::{Adversary, Collection, Entry, EntryRef, RecordId, Skill};
pub use source::{DataSource, LoadError};
pub use store::{Catalog, RecordStore};
