//! Persisted rows. Relationships are id-based; the store is the arena.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: i32,
    pub sanity: i32,
    pub morality: i32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self { health: STAT_MAX, sanity: STAT_MAX, morality: 0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub health: i32,
    pub sanity: i32,
    pub morality: i32,
}

impl StatDelta {
    pub fn sanity(amount: i32) -> Self {
        Self { sanity: amount, ..Self::default() }
    }

    pub fn is_zero(&self) -> bool {
        self.health == 0 && self.sanity == 0 && self.morality == 0
    }
}

impl PlayerStats {
    /// Applies a delta and clamps every stat to its range.
    pub fn apply(&mut self, delta: StatDelta) {
        self.health = clamp_stat(self.health.saturating_add(delta.health));
        self.sanity = clamp_stat(self.sanity.saturating_add(delta.sanity));
        self.morality = clamp_morality(self.morality.saturating_add(delta.morality));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Active,
    Dead,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub seed: u64,
    pub difficulty: String,
    pub player_name: String,
    pub start_room: RoomId,
    pub current_room: RoomId,
    pub turn: u64,
    pub stats: PlayerStats,
    pub inventory: BTreeMap<String, u32>,
    pub status: RunStatus,
}

impl Run {
    pub fn has_item(&self, key: &str) -> bool {
        self.inventory.get(key).is_some_and(|quantity| *quantity > 0)
    }

    pub fn add_item(&mut self, key: &str, quantity: u32) {
        let entry = self.inventory.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    pub fn is_over(&self) -> bool {
        self.status == RunStatus::Dead
    }
}

/// Per-run tunables. Only frontier expansion mutates it (cursor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run_id: RunId,
    pub endless: bool,
    pub max_rooms: Option<u32>,
    pub ring_radius: u32,
    pub rooms_per_turn: u32,
    pub content_packs: Vec<String>,
    pub world_gen_cursor: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub run_id: RunId,
    pub coord: Coord,
    pub depth: u32,
    pub danger: u8,
    pub name: String,
    pub theme: String,
    pub tags: Vec<String>,
    pub exits: BTreeMap<Direction, RoomId>,
    pub has_been_searched: bool,
    pub is_cleared: bool,
    /// New exits the frontier has added to this room so far.
    #[serde(default)]
    pub frontier_added: u32,
    /// Set once the frontier has met this room's exit target or run out of directions.
    #[serde(default)]
    pub frontier_grown: bool,
}

impl Room {
    pub fn exit(&self, direction: Direction) -> Option<RoomId> {
        self.exits.get(&direction).copied()
    }

    pub fn missing_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|direction| !self.exits.contains_key(direction))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: ObjectId,
    pub run_id: RunId,
    pub room_id: RoomId,
    pub hidden: bool,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    GroundItem(GroundItem),
    Chest(Chest),
    Trap(Trap),
    PuzzleGate(PuzzleGate),
    Campfire(Campfire),
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GroundItem(_) => "item",
            Self::Chest(_) => "chest",
            Self::Trap(_) => "trap",
            Self::PuzzleGate(_) => "gate",
            Self::Campfire(_) => "campfire",
        }
    }

    pub fn as_gate(&self) -> Option<&PuzzleGate> {
        match self {
            Self::PuzzleGate(gate) => Some(gate),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundItem {
    pub item_key: String,
    pub quantity: u32,
    pub taken: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item_key: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chest {
    pub loot: Vec<LootEntry>,
    pub required_key: Option<String>,
    pub opened: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapTiming {
    OnEnter,
    OnSearch,
    OnInteract,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapState {
    #[default]
    Armed,
    Triggered,
    Disarmed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub timing: TrapTiming,
    pub health_delta: i32,
    pub sanity_delta: i32,
    pub state: TrapState,
}

impl Trap {
    pub fn is_armed(&self) -> bool {
        self.state == TrapState::Armed
    }

    pub fn penalty(&self) -> StatDelta {
        StatDelta { health: self.health_delta, sanity: self.sanity_delta, morality: 0 }
    }
}

/// `required_key: None` is an unconditional block that can never be solved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleGate {
    pub blocked_direction: Direction,
    pub required_key: Option<String>,
    pub solved: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campfire {
    pub consumed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorTraits {
    pub intensity: u8,
    pub morality: i32,
    pub disposition: Disposition,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub run_id: RunId,
    pub room_id: RoomId,
    pub archetype: String,
    pub name: String,
    pub traits: ActorTraits,
    pub alive: bool,
    pub kind: ActorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorKind {
    Npc(NpcState),
    Enemy(EnemyState),
}

impl ActorKind {
    pub fn tag(&self) -> ActorKindTag {
        match self {
            Self::Npc(_) => ActorKindTag::Npc,
            Self::Enemy(_) => ActorKindTag::Enemy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcState {
    pub sanity: i32,
    pub auto_speak: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyState {
    pub hostile: bool,
    pub speech_level: u8,
    pub pacify_progress: u8,
    pub pacify_unlocked: bool,
    pub pacified: bool,
}

impl Actor {
    pub fn tag(&self) -> ActorKindTag {
        self.kind.tag()
    }

    pub fn is_alive_enemy(&self) -> bool {
        self.alive && self.tag() == ActorKindTag::Enemy
    }

    pub fn is_alive_npc(&self) -> bool {
        self.alive && self.tag() == ActorKindTag::Npc
    }

    pub fn enemy(&self) -> Option<&EnemyState> {
        match &self.kind {
            ActorKind::Enemy(state) => Some(state),
            ActorKind::Npc(_) => None,
        }
    }

    pub fn enemy_mut(&mut self) -> Option<&mut EnemyState> {
        match &mut self.kind {
            ActorKind::Enemy(state) => Some(state),
            ActorKind::Npc(_) => None,
        }
    }

    pub fn npc(&self) -> Option<&NpcState> {
        match &self.kind {
            ActorKind::Npc(state) => Some(state),
            ActorKind::Enemy(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub run_id: RunId,
    pub actor_id: ActorId,
    pub node_key: String,
    pub phase: Phase,
    pub last_content_keys: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEvent {
    pub id: EventId,
    pub run_id: RunId,
    pub turn: u64,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    RunCreated { seed: u64, difficulty: String, rooms: u32 },
    Moved { from: RoomId, to: RoomId, direction: Direction },
    TrapTriggered { object: ObjectId, health: i32, sanity: i32 },
    TrapDisarmed { object: ObjectId },
    ItemTaken { object: ObjectId, item_key: String, quantity: u32 },
    ChestOpened { object: ObjectId },
    GateSolved { object: ObjectId },
    CampfireRested { object: ObjectId },
    RoomSearched { room: RoomId, revealed: u32 },
    TurnAdvanced { reason: TurnReason },
    ActorSpawned { actor: ActorId, kind: ActorKindTag, room: RoomId },
    ActorEnteredPlayerRoom { actor: ActorId, from: RoomId },
    ActorLeftPlayerRoom { actor: ActorId, to: RoomId },
    TalkedToEnemy { actor: ActorId, progress: u8 },
    PacifyUnlocked { actor: ActorId },
    Pacified { actor: ActorId, room: RoomId, sanity_cost: i32 },
    DialogueChosen { actor: ActorId, node: String, choice: String },
    FrontierExpanded { generated: u32, connected: u32, cursor: u64 },
    PlayerDied,
}
