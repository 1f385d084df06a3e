//! Interactive browser command.

use anyhow::Result;
use dossier_core::config::Config;
use dossier_core::source::DataSource;

pub fn run(config: &Config, source: DataSource) -> Result<()> {
    dossier_tui::run_browser(config, source)
}
