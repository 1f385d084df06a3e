//! Record types loaded from the data collections.
//!
//! Every collection is a JSON array of objects with an `id` field. Adversaries
//! and skills are typed; weapons, talents and qualities are loose [`Entry`]
//! values that adversaries point at through [`EntryRef`]s.

use std::collections::BTreeMap;
use std::fmt;

use enum_map::Enum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Named data collections, one Record Store each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Collection {
    Skills,
    Adversaries,
    Weapons,
    Talents,
    Qualities,
}

impl Collection {
    /// All collections in startup order.
    pub const ALL: [Collection; 5] = [
        Collection::Skills,
        Collection::Adversaries,
        Collection::Weapons,
        Collection::Talents,
        Collection::Qualities,
    ];

    /// Collection name, also the file stem used by data sources.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Skills => "skills",
            Collection::Adversaries => "adversaries",
            Collection::Weapons => "weapons",
            Collection::Talents => "talents",
            Collection::Qualities => "qualities",
        }
    }

    /// File name of the collection inside a data directory or base URL.
    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record that can live in a [`RecordStore`](crate::store::RecordStore).
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &RecordId;
}

/// Record identity, unique within a collection.
///
/// Source data uses both string and integer ids; integers are kept as their
/// decimal text so `"12"` and `12` name the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => RecordId(text),
            RawId::Signed(n) => RecordId(n.to_string()),
            RawId::Unsigned(n) => RecordId(n.to_string()),
        })
    }
}

/// Adversary category from the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdversaryKind {
    Minion,
    Rival,
    Nemesis,
    #[default]
    Unknown,
    Other(String),
}

impl AdversaryKind {
    pub fn is_minion(&self) -> bool {
        matches!(self, AdversaryKind::Minion)
    }

    pub fn label(&self) -> &str {
        match self {
            AdversaryKind::Minion => "Minion",
            AdversaryKind::Rival => "Rival",
            AdversaryKind::Nemesis => "Nemesis",
            AdversaryKind::Unknown => "",
            AdversaryKind::Other(label) => label,
        }
    }
}

impl From<String> for AdversaryKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Minion" => AdversaryKind::Minion,
            "Rival" => AdversaryKind::Rival,
            "Nemesis" => AdversaryKind::Nemesis,
            "" => AdversaryKind::Unknown,
            _ => AdversaryKind::Other(label),
        }
    }
}

impl From<AdversaryKind> for String {
    fn from(kind: AdversaryKind) -> Self {
        kind.label().to_string()
    }
}

/// A character from the `adversaries` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adversary {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AdversaryKind,
    #[serde(default, deserialize_with = "tags_from_list_or_text")]
    pub tags: Vec<String>,
    /// Characteristic name to value, e.g. `Brawn -> 2`.
    #[serde(default)]
    pub characteristics: BTreeMap<String, u32>,
    /// Skill name to rank for skills this adversary possesses.
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
    #[serde(default)]
    pub weapons: Vec<EntryRef>,
    #[serde(default)]
    pub talents: Vec<EntryRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Adversary {
    /// Tags joined the way the filter matches against them.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }

    pub fn characteristic(&self, name: &str) -> u32 {
        self.characteristics.get(name).copied().unwrap_or(0)
    }

    /// Rank in `skill`, or `None` when the adversary does not possess it.
    pub fn skill_rank(&self, skill: &str) -> Option<u32> {
        self.skills.get(skill).copied()
    }
}

impl Record for Adversary {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// A skill definition from the `skills` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    /// Name of the characteristic this skill rolls with.
    #[serde(default)]
    pub characteristic: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Skill {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// A weapon, talent or quality entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// The entry's name, or its id when it has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// A scalar field as text. Strings are taken as-is, numbers and booleans
    /// are formatted; arrays, objects and nulls read as missing.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.extra.get(field)? {
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// References listed under `field`. Malformed lists read as empty.
    pub fn references(&self, field: &str) -> Vec<EntryRef> {
        self.extra
            .get(field)
            .and_then(|value| Vec::<EntryRef>::deserialize(value).ok())
            .unwrap_or_default()
    }
}

impl Record for Entry {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// A pointer from one record to an [`Entry`] in another collection.
///
/// Written either as a bare id or name (`"stun"`, `7`) or as an object
/// carrying a rank (`{"id": "pierce", "rank": 2}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRef {
    /// Id or name of the target entry.
    pub key: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl EntryRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: RecordId::new(key),
            rank: None,
        }
    }

    #[must_use]
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }
}

impl<'de> Deserialize<'de> for EntryRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRef {
            Key(RecordId),
            Ranked {
                #[serde(alias = "name")]
                id: RecordId,
                #[serde(default)]
                rank: Option<u32>,
            },
        }

        Ok(match RawRef::deserialize(deserializer)? {
            RawRef::Key(key) => EntryRef { key, rank: None },
            RawRef::Ranked { id, rank } => EntryRef { key: id, rank },
        })
    }
}

fn tags_from_list_or_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<String>),
        Text(String),
        Missing(()),
    }

    Ok(match RawTags::deserialize(deserializer)? {
        RawTags::List(tags) => tags,
        RawTags::Text(text) if text.is_empty() => Vec::new(),
        RawTags::Text(text) => vec![text],
        RawTags::Missing(()) => Vec::new(),
    })
}
