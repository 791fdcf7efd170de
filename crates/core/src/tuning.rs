//! Balancing knobs. Values are external configuration; the defaults are a starting point.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::de::Error as TomlError;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("tuning TOML error: {0}")]
    Toml(#[from] TomlError),
}

/// Inclusive integer range read from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: i32,
    pub max: i32,
}

impl Span {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub chain_length: Span,
    pub branch_attempts: Span,
    pub ground_items: Span,
    pub hidden_item_chance: f64,
    pub chests: Span,
    pub locked_chest_chance: f64,
    pub chest_loot: Span,
    pub traps: Span,
    pub trap_min_danger: u8,
    pub trap_health_penalty: Span,
    pub trap_sanity_penalty: Span,
    pub campfires: Span,
    pub gate_min_rooms: usize,
    pub gate_chance: f64,
    pub pack_theme_boost: f64,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            chain_length: Span::new(6, 10),
            branch_attempts: Span::new(1, 2),
            ground_items: Span::new(2, 4),
            hidden_item_chance: 0.3,
            chests: Span::new(2, 3),
            locked_chest_chance: 0.5,
            chest_loot: Span::new(1, 3),
            traps: Span::new(1, 2),
            trap_min_danger: 2,
            trap_health_penalty: Span::new(5, 15),
            trap_sanity_penalty: Span::new(3, 10),
            campfires: Span::new(2, 3),
            gate_min_rooms: 4,
            gate_chance: 0.6,
            pack_theme_boost: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierTuning {
    pub min_exits: u32,
    pub max_exits: u32,
    pub item_chance: f64,
    pub campfire_chance: f64,
    pub trap_chance: f64,
    pub gate_chance: f64,
}

impl Default for FrontierTuning {
    fn default() -> Self {
        Self {
            min_exits: 2,
            max_exits: 3,
            item_chance: 0.25,
            campfire_chance: 0.1,
            trap_chance: 0.15,
            gate_chance: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorTuning {
    pub follow_bias: f64,
    pub npc_auto_speak_chance: f64,
    /// Base talk gain per speech tier; simpler enemies calm faster.
    pub pacify_tier_gain: [u32; 3],
    pub pacify_base_cost: f64,
}

impl Default for ActorTuning {
    fn default() -> Self {
        Self {
            follow_bias: 0.5,
            npc_auto_speak_chance: 0.3,
            pacify_tier_gain: [30, 20, 12],
            pacify_base_cost: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereTuning {
    pub drain_chance: f64,
    pub drain_amount: Span,
    pub enemy_presence_drain: i32,
    pub friendly_npc_comfort: i32,
    pub campfire_health: i32,
    pub campfire_sanity: i32,
}

impl Default for AtmosphereTuning {
    fn default() -> Self {
        Self {
            drain_chance: 0.6,
            drain_amount: Span::new(1, 2),
            enemy_presence_drain: 2,
            friendly_npc_comfort: 1,
            campfire_health: 15,
            campfire_sanity: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeTuning {
    pub fear_bias_max: f64,
    pub narration_lines: usize,
    pub dialogue_lines: usize,
}

impl Default for ComposeTuning {
    fn default() -> Self {
        Self { fear_bias_max: 4.0, narration_lines: 2, dialogue_lines: 1 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub frontier: FrontierTuning,
    pub actors: ActorTuning,
    pub atmosphere: AtmosphereTuning,
    pub compose: ComposeTuning,
}

impl Tuning {
    pub fn from_toml_str(input: &str) -> Result<Self, TuningError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, TuningError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}
