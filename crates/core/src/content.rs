//! Externally authored content: items, room themes, actor archetypes, dialogue,
//! snippets, vocabulary, and difficulty profiles. Read-only to the simulation.

mod defaults;

use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::de::Error as TomlError;
use xxhash_rust::xxh3::Xxh3;

use crate::types::{ActorKindTag, Disposition, Phase};

pub mod keys {
    pub const KEY_BRASS: &str = "key_brass";
    pub const KEY_BONE: &str = "key_bone";
    pub const KEY_GLASS: &str = "key_glass";
    pub const KEY_IRON: &str = "key_iron";

    pub const LANTERN_OIL: &str = "lantern_oil";
    pub const BANDAGE: &str = "bandage";
    pub const CANDLE_STUB: &str = "candle_stub";
    pub const OLD_COIN: &str = "old_coin";
    pub const DRIED_HERBS: &str = "dried_herbs";
    pub const TORN_PAGE: &str = "torn_page";
    pub const SALT_POUCH: &str = "salt_pouch";

    pub const DIFFICULTY_STORY: &str = "story";
    pub const DIFFICULTY_NORMAL: &str = "normal";
    pub const DIFFICULTY_HARD: &str = "hard";
    pub const DIFFICULTY_ENDLESS: &str = "endless";

    pub const PACK_ABYSS: &str = "abyss";
    pub const PACK_DROWNED: &str = "drowned";
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("content TOML error: {0}")]
    Toml(#[from] TomlError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub key_item: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomTheme {
    pub key: String,
    pub names: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pack: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorArchetype {
    pub key: String,
    pub kind: ActorKindTag,
    pub names: Vec<String>,
    pub intensity_min: u8,
    pub intensity_max: u8,
    #[serde(default)]
    pub pack: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub key: String,
    pub name: String,
    pub min_npcs_per_room: u32,
    pub min_enemies_per_room: u32,
    pub max_npcs_per_room: u32,
    pub max_enemies_per_room: u32,
    pub spawn_chance: f64,
    pub move_chance: f64,
    pub npc_spawn_multiplier: f64,
    pub enemy_spawn_multiplier: f64,
    pub enemy_pressure: f64,
    pub sanity_drain_multiplier: f64,
    pub pacify_cost_multiplier: f64,
    #[serde(default)]
    pub endless: bool,
    #[serde(default)]
    pub ring_radius: u32,
    #[serde(default)]
    pub rooms_per_turn: u32,
    #[serde(default)]
    pub max_rooms: Option<u32>,
    #[serde(default)]
    pub content_packs: Vec<String>,
}

/// A composable line with eligibility predicates and a selection weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub sanity_min: Option<i32>,
    #[serde(default)]
    pub sanity_max: Option<i32>,
    #[serde(default)]
    pub morality_min: Option<i32>,
    #[serde(default)]
    pub morality_max: Option<i32>,
    #[serde(default)]
    pub pack: Option<String>,
    #[serde(default)]
    pub disposition: Option<Disposition>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FearWord {
    pub key: String,
    pub word: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub sanity_min: Option<i32>,
    #[serde(default)]
    pub sanity_max: Option<i32>,
    #[serde(default)]
    pub pack: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueChoice {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub morality_delta: i32,
    #[serde(default)]
    pub sanity_delta: i32,
    #[serde(default)]
    pub disposition: Option<Disposition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub themes: Vec<RoomTheme>,
    #[serde(default)]
    pub archetypes: Vec<ActorArchetype>,
    #[serde(default)]
    pub difficulties: Vec<DifficultyProfile>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
    #[serde(default)]
    pub fear_words: Vec<FearWord>,
    #[serde(default)]
    pub dialogue: Vec<DialogueNode>,
}

fn default_weight() -> f64 {
    1.0
}

impl ContentCatalog {
    pub fn build_default() -> Self {
        defaults::catalog()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ContentError> {
        Ok(toml::from_str(input)?)
    }

    /// Loads a TOML catalog and layers it over the built-in content.
    pub fn load_over_default(path: &Path) -> Result<Self, ContentError> {
        let loaded = Self::from_toml_str(&fs::read_to_string(path)?)?;
        let mut catalog = Self::build_default();
        catalog.merge(loaded);
        Ok(catalog)
    }

    /// Entries from `other` replace entries with the same key; new keys are appended.
    pub fn merge(&mut self, other: ContentCatalog) {
        merge_by_key(&mut self.items, other.items, |item| &item.key);
        merge_by_key(&mut self.themes, other.themes, |theme| &theme.key);
        merge_by_key(&mut self.archetypes, other.archetypes, |archetype| &archetype.key);
        merge_by_key(&mut self.difficulties, other.difficulties, |profile| &profile.key);
        merge_by_key(&mut self.snippets, other.snippets, |snippet| &snippet.key);
        merge_by_key(&mut self.fear_words, other.fear_words, |word| &word.key);
        merge_by_key(&mut self.dialogue, other.dialogue, |node| &node.key);
    }

    pub fn item(&self, key: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn item_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.item(key).map_or(key, |item| item.name.as_str())
    }

    pub fn key_item_pool(&self) -> Vec<&ItemDef> {
        self.items.iter().filter(|item| item.key_item).collect()
    }

    pub fn loot_pool(&self) -> Vec<&ItemDef> {
        self.items.iter().filter(|item| !item.key_item).collect()
    }

    pub fn difficulty(&self, key: &str) -> Option<&DifficultyProfile> {
        self.difficulties.iter().find(|profile| profile.key == key)
    }

    pub fn archetypes_of(&self, kind: ActorKindTag) -> Vec<&ActorArchetype> {
        self.archetypes.iter().filter(|archetype| archetype.kind == kind).collect()
    }

    pub fn dialogue_node(&self, key: &str) -> Option<&DialogueNode> {
        self.dialogue.iter().find(|node| node.key == key)
    }

    pub fn dialogue_roots(&self) -> Vec<&DialogueNode> {
        self.dialogue.iter().filter(|node| node.root).collect()
    }

    /// Stable fingerprint recorded in journals so replays can detect content drift.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hasher.write(&bytes);
        hasher.finish()
    }
}

impl Default for ContentCatalog {
    fn default() -> Self {
        Self::build_default()
    }
}

fn merge_by_key<T>(base: &mut Vec<T>, incoming: Vec<T>, key_of: impl Fn(&T) -> &String) {
    for entry in incoming {
        match base.iter().position(|existing| key_of(existing) == key_of(&entry)) {
            Some(index) => base[index] = entry,
            None => base.push(entry),
        }
    }
}
