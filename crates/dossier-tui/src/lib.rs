//! Full-screen terminal browser for Dossier.

pub mod common;
pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};
use std::sync::Arc;

use anyhow::Result;
use dossier_core::config::Config;
use dossier_core::source::DataSource;
use dossier_core::store::Catalog;
pub use runtime::TuiRuntime;

/// Runs the interactive browser until the user quits.
///
/// Must be called from within a multi-threaded tokio runtime: store loads
/// run as spawned tasks while this function blocks on terminal input.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal cannot be
/// driven.
pub fn run_browser(config: &Config, source: DataSource) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The browser requires a terminal.\n\
             Use `dossier list` or `dossier show <ID>` for non-interactive output."
        );
    }

    tracing::info!(source = %source.location(), "starting browser");
    let catalog = Arc::new(Catalog::new());
    let mut runtime = TuiRuntime::new(catalog, source, config.show_all_skills)?;
    runtime.run()
}
