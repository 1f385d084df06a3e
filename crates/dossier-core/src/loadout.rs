//! Weapons and talents of a character, resolved against their collections.
//!
//! References are matched by id first, then by exact name. A reference that
//! matches nothing still produces a line named after the reference itself, so
//! incomplete data sets stay readable.

use std::fmt;
use std::sync::Arc;

use crate::record::{Adversary, Entry, EntryRef};

/// A weapon quality as listed on a weapon, e.g. `Pierce 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLine {
    pub name: String,
    pub rank: Option<u32>,
}

impl fmt::Display for QualityLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{} {rank}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaponLine {
    pub name: String,
    pub skill: Option<String>,
    pub damage: Option<String>,
    pub critical: Option<String>,
    pub range: Option<String>,
    pub qualities: Vec<QualityLine>,
    /// False when the reference matched no weapon record.
    pub resolved: bool,
}

impl WeaponLine {
    /// Profile fields followed by qualities, in display order.
    pub fn details(&self) -> Vec<String> {
        let mut details = Vec::new();
        if let Some(skill) = &self.skill {
            details.push(skill.clone());
        }
        if let Some(damage) = &self.damage {
            details.push(format!("Damage {damage}"));
        }
        if let Some(critical) = &self.critical {
            details.push(format!("Critical {critical}"));
        }
        if let Some(range) = &self.range {
            details.push(format!("Range {range}"));
        }
        details.extend(self.qualities.iter().map(ToString::to_string));
        details
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentLine {
    pub name: String,
    pub rank: Option<u32>,
    pub description: Option<String>,
    pub resolved: bool,
}

impl fmt::Display for TalentLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{} {rank}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Everything a character carries besides skills.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loadout {
    pub weapons: Vec<WeaponLine>,
    pub talents: Vec<TalentLine>,
}

impl Loadout {
    /// Resolves `character`'s weapon and talent references.
    ///
    /// Weapon qualities come from the weapon record's `qualities` list and
    /// are resolved against `qualities`.
    pub fn resolve(
        character: &Adversary,
        weapons: &[Arc<Entry>],
        talents: &[Arc<Entry>],
        qualities: &[Arc<Entry>],
    ) -> Self {
        let weapons = character
            .weapons
            .iter()
            .map(|reference| match find(weapons, reference) {
                Some(weapon) => WeaponLine {
                    name: weapon.display_name().to_string(),
                    skill: weapon.text("skill"),
                    damage: weapon.text("damage"),
                    critical: weapon.text("critical"),
                    range: weapon.text("range"),
                    qualities: weapon
                        .references("qualities")
                        .iter()
                        .map(|quality| QualityLine {
                            name: name_of(qualities, quality),
                            rank: quality.rank,
                        })
                        .collect(),
                    resolved: true,
                },
                None => WeaponLine {
                    name: reference.key.to_string(),
                    skill: None,
                    damage: None,
                    critical: None,
                    range: None,
                    qualities: Vec::new(),
                    resolved: false,
                },
            })
            .collect();

        let talents = character
            .talents
            .iter()
            .map(|reference| {
                let talent = find(talents, reference);
                TalentLine {
                    name: talent.map_or_else(
                        || reference.key.to_string(),
                        |t| t.display_name().to_string(),
                    ),
                    rank: reference.rank,
                    description: talent.and_then(|t| t.text("description")),
                    resolved: talent.is_some(),
                }
            })
            .collect();

        Self { weapons, talents }
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty() && self.talents.is_empty()
    }
}

fn find<'a>(entries: &'a [Arc<Entry>], reference: &EntryRef) -> Option<&'a Entry> {
    entries
        .iter()
        .find(|entry| entry.id == reference.key)
        .or_else(|| {
            entries
                .iter()
                .find(|entry| entry.name.as_deref() == Some(reference.key.as_str()))
        })
        .map(Arc::as_ref)
}

fn name_of(entries: &[Arc<Entry>], reference: &EntryRef) -> String {
    find(entries, reference).map_or_else(
        || reference.key.to_string(),
        |entry| entry.display_name().to_string(),
    )
}
