//! Skill projection: the per-character skill rows shown in a tab.
//!
//! Pure functions only. The same inputs always produce the same rows.

use std::sync::Arc;

use crate::record::{Adversary, RecordId, Skill};

/// Grade of a single die in a skill roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DieGrade {
    Proficiency,
    Ability,
    Boost,
}

impl DieGrade {
    /// Single-character symbol for text renderers.
    pub fn glyph(self) -> char {
        match self {
            DieGrade::Proficiency => '◆',
            DieGrade::Ability => '◇',
            DieGrade::Boost => '□',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DieGrade::Proficiency => "proficiency",
            DieGrade::Ability => "ability",
            DieGrade::Boost => "boost",
        }
    }
}

/// Multiset of dice for one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DicePool {
    pub proficiency: u32,
    pub ability: u32,
    pub boost: u32,
}

impl DicePool {
    /// Resolves the pool for a characteristic value and a skill rank.
    ///
    /// Ranks up to the statistic upgrade to proficiency, the rest of the
    /// statistic stays ability, and ranks beyond the statistic become boost.
    pub fn resolve(statistic: u32, rank: u32) -> Self {
        Self {
            proficiency: rank.min(statistic),
            ability: statistic.saturating_sub(rank),
            boost: rank.saturating_sub(statistic),
        }
    }

    pub fn len(&self) -> u32 {
        self.proficiency + self.ability + self.boost
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dice in display order: proficiency, ability, boost.
    pub fn dice(&self) -> impl Iterator<Item = DieGrade> + use<> {
        std::iter::repeat_n(DieGrade::Proficiency, self.proficiency as usize)
            .chain(std::iter::repeat_n(DieGrade::Ability, self.ability as usize))
            .chain(std::iter::repeat_n(DieGrade::Boost, self.boost as usize))
    }

    /// The pool as a string of glyphs.
    pub fn glyphs(&self) -> String {
        self.dice().map(DieGrade::glyph).collect()
    }
}

/// Largest minion group a projection scales to. Larger groups are clamped.
pub const MAX_MINIONS: u32 = 99;

/// View toggles that feed the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Include catalog skills the character does not possess.
    pub show_all: bool,
    /// Size of a minion group. Zero and one leave ranks unchanged; values
    /// above [`MAX_MINIONS`] count as [`MAX_MINIONS`].
    pub minions: u32,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            show_all: false,
            minions: 1,
        }
    }
}

/// One displayable skill row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRow {
    pub id: RecordId,
    pub name: String,
    pub characteristic: String,
    /// Characteristic value the skill rolls with.
    pub statistic: u32,
    /// Effective rank, including minion group scaling.
    pub rank: u32,
    pub pool: DicePool,
    /// Emphasis hint: "show all" is on and the skill is possessed.
    pub has_rank: bool,
}

/// Projects `character`'s skills over the catalog, in catalog order.
///
/// A minion group of `minions > 0` adds `minions - 1` ranks to every skill
/// the template possesses. The group is clamped to [`MAX_MINIONS`] and the
/// rank saturates.
pub fn project_skills(
    character: &Adversary,
    catalog: &[Arc<Skill>],
    options: ProjectionOptions,
) -> Vec<SkillRow> {
    catalog
        .iter()
        .filter_map(|skill| {
            let possessed = character.skill_rank(&skill.name);
            if !options.show_all && possessed.is_none() {
                return None;
            }

            let statistic = character.characteristic(&skill.characteristic);
            let mut rank = possessed.unwrap_or(0);
            if character.kind.is_minion() && options.minions > 0 && possessed.is_some() {
                rank = rank.saturating_add(options.minions.min(MAX_MINIONS) - 1);
            }

            Some(SkillRow {
                id: skill.id.clone(),
                name: skill.name.clone(),
                characteristic: skill.characteristic.clone(),
                statistic,
                rank,
                pool: DicePool::resolve(statistic, rank),
                has_rank: options.show_all && possessed.is_some(),
            })
        })
        .collect()
}
