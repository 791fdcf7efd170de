//! Public data models for generated worlds. Rooms are addressed by local index
//! until the world is persisted and receives store ids.

use std::collections::BTreeMap;

use crate::state::{ObjectKind, TrapTiming};
use crate::types::{Coord, Direction};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedRoom {
    pub coord: Coord,
    pub depth: u32,
    pub danger: u8,
    pub name: String,
    pub theme: String,
    pub tags: Vec<String>,
    pub exits: BTreeMap<Direction, usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedObject {
    pub room: usize,
    pub hidden: bool,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedWorld {
    pub seed: u64,
    pub rooms: Vec<GeneratedRoom>,
    /// Rooms `0..chain_len` form the primary chain; branches follow.
    pub chain_len: usize,
    pub objects: Vec<GeneratedObject>,
    pub start: usize,
    pub key_item: Option<String>,
    pub gates_stripped: u32,
}

impl GeneratedWorld {
    pub fn room_index_at(&self, coord: Coord) -> Option<usize> {
        self.rooms.iter().position(|room| room.coord == coord)
    }

    /// Connects `from` to `to` in both directions unless either side already
    /// has an exit that way. Returns whether the edge was created.
    pub(super) fn link(&mut self, from: usize, direction: Direction, to: usize) -> bool {
        if self.rooms[from].exits.contains_key(&direction)
            || self.rooms[to].exits.contains_key(&direction.opposite())
        {
            return false;
        }
        self.rooms[from].exits.insert(direction, to);
        self.rooms[to].exits.insert(direction.opposite(), from);
        true
    }

    pub fn gate_count(&self) -> usize {
        self.objects.iter().filter(|object| object.kind.as_gate().is_some()).count()
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(self.seed.to_le_bytes());
        bytes.extend((self.rooms.len() as u32).to_le_bytes());
        bytes.extend((self.chain_len as u32).to_le_bytes());
        bytes.extend((self.start as u32).to_le_bytes());
        for room in &self.rooms {
            bytes.extend(room.coord.x.to_le_bytes());
            bytes.extend(room.coord.y.to_le_bytes());
            bytes.extend(room.depth.to_le_bytes());
            bytes.push(room.danger);
            push_str(&mut bytes, &room.name);
            push_str(&mut bytes, &room.theme);
            bytes.extend((room.tags.len() as u32).to_le_bytes());
            for tag in &room.tags {
                push_str(&mut bytes, tag);
            }
            bytes.push(room.exits.len() as u8);
            for (direction, target) in &room.exits {
                bytes.push(direction.code() as u8);
                bytes.extend((*target as u32).to_le_bytes());
            }
        }

        bytes.extend((self.objects.len() as u32).to_le_bytes());
        for object in &self.objects {
            bytes.extend((object.room as u32).to_le_bytes());
            bytes.push(u8::from(object.hidden));
            match &object.kind {
                ObjectKind::GroundItem(item) => {
                    bytes.push(0);
                    push_str(&mut bytes, &item.item_key);
                    bytes.extend(item.quantity.to_le_bytes());
                }
                ObjectKind::Chest(chest) => {
                    bytes.push(1);
                    push_optional_str(&mut bytes, chest.required_key.as_deref());
                    bytes.extend((chest.loot.len() as u32).to_le_bytes());
                    for entry in &chest.loot {
                        push_str(&mut bytes, &entry.item_key);
                        bytes.extend(entry.quantity.to_le_bytes());
                    }
                }
                ObjectKind::Trap(trap) => {
                    bytes.push(2);
                    bytes.push(match trap.timing {
                        TrapTiming::OnEnter => 0,
                        TrapTiming::OnSearch => 1,
                        TrapTiming::OnInteract => 2,
                    });
                    bytes.extend(trap.health_delta.to_le_bytes());
                    bytes.extend(trap.sanity_delta.to_le_bytes());
                }
                ObjectKind::PuzzleGate(gate) => {
                    bytes.push(3);
                    bytes.push(gate.blocked_direction.code() as u8);
                    push_optional_str(&mut bytes, gate.required_key.as_deref());
                }
                ObjectKind::Campfire(_) => bytes.push(4),
            }
        }
        push_optional_str(&mut bytes, self.key_item.as_deref());
        bytes
    }
}

fn push_str(bytes: &mut Vec<u8>, value: &str) {
    bytes.extend((value.len() as u32).to_le_bytes());
    bytes.extend(value.as_bytes());
}

fn push_optional_str(bytes: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(value) => {
            bytes.push(1);
            push_str(bytes, value);
        }
        None => bytes.push(0),
    }
}
