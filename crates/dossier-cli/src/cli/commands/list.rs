//! `dossier list`: the navigation list as text.

use anyhow::Result;
use dossier_core::browser;
use dossier_core::dispatch::Action;
use dossier_core::source::DataSource;

use super::load_catalog;

pub async fn run(source: &DataSource, filter: Option<&str>) -> Result<()> {
    let (_catalog, mut state) = load_catalog(source).await?;

    if let Some(text) = filter {
        let registry = browser::registry();
        registry.dispatch(&mut state, &Action::MenuFilter(text.to_string()))?;
    }

    let visible = state.visible_list().unwrap_or_default();
    for adversary in visible {
        println!("{}\t{}", adversary.id, adversary.name);
    }
    println!(
        "Showing {} of {}.",
        visible.len(),
        state.all_adversaries().len()
    );
    Ok(())
}
