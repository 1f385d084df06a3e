//! `dossier show`: one adversary's character panel as text.

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use dossier_core::browser;
use dossier_core::dispatch::Action;
use dossier_core::loadout::Loadout;
use dossier_core::projection::{ProjectionOptions, project_skills};
use dossier_core::record::RecordId;
use dossier_core::source::DataSource;

use super::load_catalog;

pub async fn run(source: &DataSource, id: &str, show_all: bool, minions: u32) -> Result<()> {
    let (catalog, mut state) = load_catalog(source).await?;

    browser::registry().dispatch(&mut state, &Action::ObjectView(RecordId::from(id)))?;
    let adversary = state
        .active_adversary()
        .with_context(|| format!("no adversary to show for '{id}'"))?;

    match adversary.kind.label() {
        "" => println!("{}", adversary.name),
        kind => println!("{} [{kind}]", adversary.name),
    }
    if !adversary.tags.is_empty() {
        println!("Tags: {}", adversary.tags.join(", "));
    }
    if !adversary.characteristics.is_empty() {
        let characteristics: Vec<String> = adversary
            .characteristics
            .iter()
            .map(|(name, value)| format!("{name} {value}"))
            .collect();
        println!("{}", characteristics.join(" · "));
    }
    if adversary.kind.is_minion() {
        println!("Group: {minions}");
    }

    let skills = catalog.skills.snapshot();
    let rows = project_skills(
        adversary,
        skills.records(),
        ProjectionOptions { show_all, minions },
    );
    if rows.is_empty() {
        println!("No skills.");
    } else {
        let minion = adversary.kind.is_minion();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if minion {
            table.set_header(vec![
                "Skill".to_string(),
                "Characteristic".to_string(),
                format!("Roll (for {minions})"),
            ]);
        } else {
            table.set_header(vec!["Skill", "Characteristic", "Rank", "Roll"]);
        }
        for row in rows {
            let name = if row.has_rank {
                format!("{} *", row.name)
            } else {
                row.name
            };
            let mut cells = vec![name, format!("{} ({})", row.characteristic, row.statistic)];
            if !minion {
                cells.push(row.rank.to_string());
            }
            cells.push(row.pool.glyphs());
            table.add_row(cells);
        }
        println!("{table}");
    }

    let loadout = Loadout::resolve(
        adversary,
        catalog.weapons.snapshot().records(),
        catalog.talents.snapshot().records(),
        catalog.qualities.snapshot().records(),
    );
    if !loadout.weapons.is_empty() {
        println!("Weapons:");
        for weapon in &loadout.weapons {
            let details = weapon.details();
            if details.is_empty() {
                println!("  {}", weapon.name);
            } else {
                println!("  {}: {}", weapon.name, details.join(" · "));
            }
        }
    }
    if !loadout.talents.is_empty() {
        println!("Talents:");
        for talent in &loadout.talents {
            match &talent.description {
                Some(description) => println!("  {talent}: {description}"),
                None => println!("  {talent}"),
            }
        }
    }
    Ok(())
}
