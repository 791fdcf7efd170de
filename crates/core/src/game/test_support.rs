//! Shared fixtures for the `game` submodule test suites.

use super::*;
use crate::store::MemoryStore;

pub(super) fn engine() -> Engine<MemoryStore> {
    Engine::new(MemoryStore::default(), ContentCatalog::build_default(), Tuning::default())
        .expect("placeholder pattern compiles")
}

pub(super) fn engine_with_run(seed: u64, difficulty: &str) -> (Engine<MemoryStore>, Run) {
    let mut engine = engine();
    let run = engine
        .create_run(NewRun {
            seed: Some(seed),
            difficulty: difficulty.to_string(),
            player_name: "Wren".to_string(),
        })
        .expect("create run");
    (engine, run)
}

pub(super) fn insert_object(
    engine: &mut Engine<MemoryStore>,
    run_id: RunId,
    room_id: RoomId,
    kind: ObjectKind,
) -> ObjectId {
    let id = ObjectId(engine.store.allocate_id(Table::Object).expect("id"));
    engine
        .store
        .put_object(WorldObject { id, run_id, room_id, hidden: false, kind })
        .expect("put object");
    id
}

pub(super) fn insert_enemy(
    engine: &mut Engine<MemoryStore>,
    run_id: RunId,
    room_id: RoomId,
    intensity: u8,
) -> ActorId {
    let id = ActorId(engine.store.allocate_id(Table::Actor).expect("id"));
    engine
        .store
        .put_actor(Actor {
            id,
            run_id,
            room_id,
            archetype: "test_shade".to_string(),
            name: "Test Shade".to_string(),
            traits: ActorTraits { intensity, morality: -10, disposition: Disposition::Hostile },
            alive: true,
            kind: ActorKind::Enemy(EnemyState {
                hostile: true,
                speech_level: speech_level(intensity),
                pacify_progress: 0,
                pacify_unlocked: false,
                pacified: false,
            }),
        })
        .expect("put actor");
    id
}

pub(super) fn insert_npc(
    engine: &mut Engine<MemoryStore>,
    run_id: RunId,
    room_id: RoomId,
    disposition: Disposition,
) -> ActorId {
    let id = ActorId(engine.store.allocate_id(Table::Actor).expect("id"));
    engine
        .store
        .put_actor(Actor {
            id,
            run_id,
            room_id,
            archetype: "test_wanderer".to_string(),
            name: "Test Wanderer".to_string(),
            traits: ActorTraits { intensity: 20, morality: 10, disposition },
            alive: true,
            kind: ActorKind::Npc(NpcState { sanity: 60, auto_speak: false }),
        })
        .expect("put actor");
    id
}

/// Removes every actor from the run so pulses start from a known state.
pub(super) fn clear_actors(engine: &mut Engine<MemoryStore>, run_id: RunId) {
    for mut actor in engine.store.actors(run_id).expect("actors") {
        actor.alive = false;
        engine.store.put_actor(actor).expect("put actor");
    }
}

pub(super) fn give_item(engine: &mut Engine<MemoryStore>, run_id: RunId, key: &str) {
    let mut run = engine.store.run(run_id).expect("read").expect("run");
    run.add_item(key, 1);
    engine.store.put_run(run).expect("put run");
}

pub(super) fn set_stats(engine: &mut Engine<MemoryStore>, run_id: RunId, stats: PlayerStats) {
    let mut run = engine.store.run(run_id).expect("read").expect("run");
    run.stats = stats;
    engine.store.put_run(run).expect("put run");
}

pub(super) fn set_profile(
    engine: &mut Engine<MemoryStore>,
    difficulty: &str,
    edit: impl FnOnce(&mut DifficultyProfile),
) {
    let profile = engine
        .content
        .difficulties
        .iter_mut()
        .find(|profile| profile.key == difficulty)
        .expect("difficulty");
    edit(profile);
}
