//! CLI command handlers.

#[cfg(feature = "tui")]
pub mod browse;
#[cfg(not(feature = "tui"))]
pub mod browse {
    use anyhow::Result;
    use dossier_core::config::Config;
    use dossier_core::source::DataSource;

    pub fn run(_config: &Config, _source: DataSource) -> Result<()> {
        anyhow::bail!("dossier was built without the `tui` feature; use `list` or `show`")
    }
}
pub mod config;
pub mod list;
pub mod show;

use anyhow::{Context, Result};
use dossier_core::browser::BrowserState;
use dossier_core::source::DataSource;
use dossier_core::store::Catalog;

/// Loads every store and returns the catalog with the initial browser state.
///
/// Headless commands need complete data, so the first load failure aborts.
pub async fn load_catalog(source: &DataSource) -> Result<(Catalog, BrowserState)> {
    let catalog = Catalog::new();
    for (collection, result) in catalog.load_all(source).await {
        result.with_context(|| format!("load {collection} from {}", source.location()))?;
    }
    tracing::debug!(
        adversaries = catalog.adversaries.snapshot().records().len(),
        "catalog loaded"
    );

    let state = BrowserState::new()
        .with_adversaries(&catalog.adversaries.snapshot())
        .with_stores_loaded(catalog.all_loaded());
    Ok((catalog, state))
}
