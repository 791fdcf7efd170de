//! Primary chain and branch layout of the initial world.

use crate::content::ContentCatalog;
use crate::rng::{KeyedRng, Purpose, coord_scope};
use crate::tuning::WorldTuning;
use crate::types::{Coord, Direction};

use super::model::{GeneratedRoom, GeneratedWorld};
use super::room::{RoomRequest, build_room};

pub(super) struct LayoutContext<'a> {
    pub(super) seed: u64,
    pub(super) packs: &'a [String],
    pub(super) catalog: &'a ContentCatalog,
    pub(super) tuning: &'a WorldTuning,
}

impl LayoutContext<'_> {
    fn room(&self, coord: Coord, depth: u32, danger_baseline: f64) -> GeneratedRoom {
        let scope = coord_scope(coord);
        let blueprint = build_room(
            &RoomRequest {
                seed: self.seed,
                purpose: Purpose::RoomBuild,
                scope: &scope,
                coord,
                depth,
                danger_baseline,
                packs: self.packs,
            },
            self.catalog,
            self.tuning,
        );
        GeneratedRoom {
            coord: blueprint.coord,
            depth: blueprint.depth,
            danger: blueprint.danger,
            name: blueprint.name,
            theme: blueprint.theme,
            tags: blueprint.tags,
            exits: Default::default(),
        }
    }
}

pub(super) fn build_layout(context: &LayoutContext<'_>) -> GeneratedWorld {
    let mut rng = KeyedRng::new(context.seed, Purpose::WorldLayout, &[]);
    let span = context.tuning.chain_length;
    let chain_len = rng.range_i32(span.min.max(1), span.max.max(1)) as usize;

    let mut world = GeneratedWorld {
        seed: context.seed,
        rooms: Vec::with_capacity(chain_len + 2),
        chain_len,
        objects: Vec::new(),
        start: 0,
        key_item: None,
        gates_stripped: 0,
    };

    let mut coord = Coord::ORIGIN;
    for index in 0..chain_len {
        let depth = index as u32;
        let mut room = context.room(coord, depth, f64::from(depth) / 2.0);
        if index == 0 {
            room.danger = 0;
        }
        world.rooms.push(room);
        if index > 0 {
            world.link(index - 1, Direction::East, index);
        }
        coord = coord.step(Direction::East);
    }

    attach_branches(context, &mut world, &mut rng);
    world
}

fn attach_branches(context: &LayoutContext<'_>, world: &mut GeneratedWorld, rng: &mut KeyedRng) {
    if world.chain_len < 2 {
        return;
    }
    let attempts = context.tuning.branch_attempts;
    let attempts = rng.range_i32(attempts.min.max(0), attempts.max.max(0));
    for _ in 0..attempts {
        let anchor = rng.range_usize(0, world.chain_len - 2);
        let direction = if rng.chance(0.5) { Direction::North } else { Direction::South };
        let anchor_room = &world.rooms[anchor];
        let coord = anchor_room.coord.step(direction);
        if anchor_room.exits.contains_key(&direction) || world.room_index_at(coord).is_some() {
            continue;
        }

        let depth = anchor_room.depth + 1;
        let room = context.room(coord, depth, f64::from(depth) / 2.0);
        world.rooms.push(room);
        let branch = world.rooms.len() - 1;
        world.link(anchor, direction, branch);
    }
}
