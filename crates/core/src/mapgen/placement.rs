//! Object placement and puzzle-gate selection for the initial world.

use tracing::debug;

use crate::content::{ContentCatalog, ItemDef};
use crate::rng::{KeyedRng, Purpose};
use crate::state::*;
use crate::tuning::{Span, WorldTuning};
use crate::types::Direction;

use super::model::{GeneratedObject, GeneratedWorld};
use super::solvability::Solvability;

const TRAP_TIMINGS: [TrapTiming; 3] =
    [TrapTiming::OnEnter, TrapTiming::OnSearch, TrapTiming::OnInteract];

pub(super) struct PlacementContext<'a> {
    pub(super) seed: u64,
    pub(super) catalog: &'a ContentCatalog,
    pub(super) tuning: &'a WorldTuning,
}

fn draw(rng: &mut KeyedRng, span: Span) -> i32 {
    rng.range_i32(span.min, span.max)
}

fn draw_count(rng: &mut KeyedRng, span: Span) -> usize {
    draw(rng, span).max(0) as usize
}

fn pick_key<'a>(rng: &mut KeyedRng, pool: &[&'a ItemDef]) -> Option<&'a ItemDef> {
    rng.pick(pool).copied()
}

pub(super) fn place_objects(context: &PlacementContext<'_>, world: &mut GeneratedWorld) {
    let mut rng = KeyedRng::new(context.seed, Purpose::WorldObjects, &[]);
    let tuning = context.tuning;
    let loot_pool = context.catalog.loot_pool();
    let key_pool = context.catalog.key_item_pool();
    let room_count = world.rooms.len();
    if room_count == 0 {
        return;
    }

    for _ in 0..draw_count(&mut rng, tuning.ground_items) {
        let Some(item) = pick_key(&mut rng, &loot_pool) else {
            break;
        };
        let room = rng.range_usize(0, room_count - 1);
        let hidden = rng.chance(tuning.hidden_item_chance);
        world.objects.push(GeneratedObject {
            room,
            hidden,
            kind: ObjectKind::GroundItem(GroundItem {
                item_key: item.key.clone(),
                quantity: 1,
                taken: false,
            }),
        });
    }

    if let Some(key) = pick_key(&mut rng, &key_pool) {
        let first_half = (world.chain_len / 2).max(1);
        let room = rng.range_usize(0, first_half - 1);
        world.key_item = Some(key.key.clone());
        world.objects.push(GeneratedObject {
            room,
            hidden: false,
            kind: ObjectKind::GroundItem(GroundItem {
                item_key: key.key.clone(),
                quantity: 1,
                taken: false,
            }),
        });
    }

    for chest_index in 0..draw_count(&mut rng, tuning.chests) {
        let room = rng.range_usize(0, room_count - 1);
        let locked = chest_index == 0 || rng.chance(tuning.locked_chest_chance);
        let mut loot = Vec::new();
        for _ in 0..draw_count(&mut rng, tuning.chest_loot) {
            if let Some(item) = pick_key(&mut rng, &loot_pool) {
                loot.push(LootEntry { item_key: item.key.clone(), quantity: 1 });
            }
        }
        let required_key = if locked { world.key_item.clone() } else { None };
        world.objects.push(GeneratedObject {
            room,
            hidden: false,
            kind: ObjectKind::Chest(Chest { loot, required_key, opened: false }),
        });
    }

    let trap_rooms: Vec<usize> = (0..room_count)
        .filter(|index| world.rooms[*index].danger >= tuning.trap_min_danger)
        .collect();
    let trap_count = draw_count(&mut rng, tuning.traps);
    if !trap_rooms.is_empty() {
        for _ in 0..trap_count {
            let Some(room) = rng.pick(&trap_rooms).copied() else {
                break;
            };
            world.objects.push(GeneratedObject {
                room,
                hidden: false,
                kind: ObjectKind::Trap(roll_trap(&mut rng, tuning)),
            });
        }
    }

    let campfire_floor = usize::from(room_count > 1);
    for _ in 0..draw_count(&mut rng, tuning.campfires) {
        let room = rng.range_usize(campfire_floor, room_count - 1);
        world.objects.push(GeneratedObject {
            room,
            hidden: false,
            kind: ObjectKind::Campfire(Campfire::default()),
        });
    }
}

pub(crate) fn roll_trap(rng: &mut KeyedRng, tuning: &WorldTuning) -> Trap {
    let timing = rng.pick(&TRAP_TIMINGS).copied().unwrap_or(TrapTiming::OnEnter);
    Trap {
        timing,
        health_delta: -draw(rng, tuning.trap_health_penalty).abs(),
        sanity_delta: -draw(rng, tuning.trap_sanity_penalty).abs(),
        state: TrapState::Armed,
    }
}

/// Places at most one gate on an interior chain room and keeps it only if the
/// validator can prove it passable.
pub(super) fn place_gate(context: &PlacementContext<'_>, world: &mut GeneratedWorld) {
    let tuning = context.tuning;
    let mut rng = KeyedRng::new(context.seed, Purpose::WorldGate, &[]);
    if world.rooms.len() < tuning.gate_min_rooms || world.chain_len < 3 {
        return;
    }
    if !rng.chance(tuning.gate_chance) {
        return;
    }
    let Some(key) = world.key_item.clone() else {
        return;
    };

    let room = rng.range_usize(1, world.chain_len - 2);
    let exits: Vec<Direction> = world.rooms[room].exits.keys().copied().collect();
    let Some(direction) = rng.pick(&exits).copied() else {
        return;
    };
    world.objects.push(GeneratedObject {
        room,
        hidden: false,
        kind: ObjectKind::PuzzleGate(PuzzleGate {
            blocked_direction: direction,
            required_key: Some(key),
            solved: false,
        }),
    });

    let solvable = Solvability::for_generated(world).check(world.start as u64).solvable;
    if !solvable {
        let before = world.objects.len();
        world.objects.retain(|object| object.kind.as_gate().is_none());
        world.gates_stripped = (before - world.objects.len()) as u32;
        debug!(
            seed = world.seed,
            room,
            direction = %direction,
            stripped = world.gates_stripped,
            "puzzle gate failed solvability; stripped"
        );
    }
}
