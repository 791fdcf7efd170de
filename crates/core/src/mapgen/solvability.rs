//! Least-fixpoint reachability over rooms and collected keys.
//!
//! Reachability and inventory grow together: visible ground items and
//! openable chests in reachable rooms add keys, and exits are followed unless
//! an unsolved gate in the departing room blocks that direction without the
//! key in hand. Hidden objects never contribute, so the check errs toward
//! rejecting a puzzle rather than approving an unwinnable one.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::{ObjectKind, Room, WorldObject};
use crate::types::Direction;

use super::model::GeneratedWorld;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphRoom {
    pub id: u64,
    pub exits: BTreeMap<Direction, u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphObject<'a> {
    pub room: u64,
    pub hidden: bool,
    pub kind: &'a ObjectKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolvabilityReport {
    pub reachable: BTreeSet<u64>,
    pub inventory: BTreeSet<String>,
    pub solvable: bool,
}

pub struct Solvability<'a> {
    rooms: BTreeMap<u64, GraphRoom>,
    objects: Vec<GraphObject<'a>>,
    inventory: BTreeSet<String>,
}

impl<'a> Solvability<'a> {
    pub fn new(rooms: Vec<GraphRoom>, objects: Vec<GraphObject<'a>>) -> Self {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id, room)).collect(),
            objects,
            inventory: BTreeSet::new(),
        }
    }

    pub fn for_generated(world: &'a GeneratedWorld) -> Self {
        let rooms = world
            .rooms
            .iter()
            .enumerate()
            .map(|(index, room)| GraphRoom {
                id: index as u64,
                exits: room.exits.iter().map(|(dir, to)| (*dir, *to as u64)).collect(),
            })
            .collect();
        let objects = world
            .objects
            .iter()
            .map(|object| GraphObject {
                room: object.room as u64,
                hidden: object.hidden,
                kind: &object.kind,
            })
            .collect();
        Self::new(rooms, objects)
    }

    pub fn for_stored(rooms: &[Room], objects: &'a [WorldObject]) -> Self {
        let rooms = rooms
            .iter()
            .map(|room| GraphRoom {
                id: room.id.0,
                exits: room.exits.iter().map(|(dir, to)| (*dir, to.0)).collect(),
            })
            .collect();
        let objects = objects
            .iter()
            .map(|object| GraphObject {
                room: object.room_id.0,
                hidden: object.hidden,
                kind: &object.kind,
            })
            .collect();
        Self::new(rooms, objects)
    }

    /// Seeds the collected set, e.g. with what the player already carries.
    pub fn with_inventory(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.inventory.extend(keys);
        self
    }

    fn blocks(&self, room: u64, direction: Direction, inventory: &BTreeSet<String>) -> bool {
        self.objects.iter().any(|object| {
            object.room == room
                && object.kind.as_gate().is_some_and(|gate| {
                    gate.blocked_direction == direction
                        && !gate.solved
                        && gate.required_key.as_ref().is_none_or(|key| !inventory.contains(key))
                })
        })
    }

    fn collect(&self, reachable: &BTreeSet<u64>, inventory: &mut BTreeSet<String>) -> bool {
        let mut changed = false;
        for object in &self.objects {
            if object.hidden || !reachable.contains(&object.room) {
                continue;
            }
            match object.kind {
                ObjectKind::GroundItem(item) if !item.taken => {
                    changed |= inventory.insert(item.item_key.clone());
                }
                ObjectKind::Chest(chest) if !chest.opened => {
                    let openable =
                        chest.required_key.as_ref().is_none_or(|key| inventory.contains(key));
                    if openable {
                        for entry in &chest.loot {
                            changed |= inventory.insert(entry.item_key.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        changed
    }

    fn expand(&self, reachable: &mut BTreeSet<u64>, inventory: &BTreeSet<String>) -> bool {
        let mut discovered = Vec::new();
        for id in reachable.iter() {
            let Some(room) = self.rooms.get(id) else {
                continue;
            };
            for (direction, target) in &room.exits {
                if reachable.contains(target) || !self.rooms.contains_key(target) {
                    continue;
                }
                if self.blocks(*id, *direction, inventory) {
                    continue;
                }
                discovered.push(*target);
            }
        }
        let mut changed = false;
        for target in discovered {
            changed |= reachable.insert(target);
        }
        changed
    }

    pub fn check(&self, start: u64) -> SolvabilityReport {
        let mut reachable = BTreeSet::from([start]);
        let mut inventory = self.inventory.clone();

        loop {
            let collected = self.collect(&reachable, &mut inventory);
            let expanded = self.expand(&mut reachable, &inventory);
            if !collected && !expanded {
                break;
            }
        }

        let solvable = self.objects.iter().all(|object| {
            let Some(gate) = object.kind.as_gate() else {
                return true;
            };
            if gate.solved || !reachable.contains(&object.room) {
                return true;
            }
            gate.required_key.as_ref().is_some_and(|key| inventory.contains(key))
        });

        SolvabilityReport { reachable, inventory, solvable }
    }
}

pub fn are_all_gates_solvable(
    rooms: Vec<GraphRoom>,
    objects: Vec<GraphObject<'_>>,
    start: u64,
) -> bool {
    Solvability::new(rooms, objects).check(start).solvable
}
