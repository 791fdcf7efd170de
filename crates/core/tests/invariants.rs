use std::collections::{BTreeMap, BTreeSet};

use hollow_core::content::ContentCatalog;
use hollow_core::game::{Engine, NewRun, PACIFY_COMPLETE};
use hollow_core::journal::InputPayload;
use hollow_core::state::{ActorKind, EventKind, RunStatus};
use hollow_core::store::{MemoryStore, Store};
use hollow_core::tuning::Tuning;
use hollow_core::types::{
    ActorId, ActorKindTag, Direction, MORALITY_MAX, MORALITY_MIN, RoomId, RunId, STAT_MAX,
    STAT_MIN, TurnReason,
};
use proptest::{
    arbitrary::any,
    sample::select,
    test_runner::{Config as ProptestConfig, TestCaseError, TestRunner},
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> Option<T> {
    if slice.is_empty() {
        return None;
    }
    Some(slice[rng.next_u64() as usize % slice.len()].clone())
}

/// Picks a plausible next input from what the player can currently see.
fn next_input(engine: &Engine<MemoryStore>, run: RunId, rng: &mut ChaCha8Rng) -> InputPayload {
    let objects = engine.visible_objects(run).unwrap_or_default();
    let actors = engine.actors_here(run).unwrap_or_default();
    match rng.next_u64() % 10 {
        0..4 => InputPayload::Move { direction: Direction::ALL[rng.next_u64() as usize % 4] },
        4 => InputPayload::Search,
        5 => match choose(rng, &objects) {
            Some(object) => InputPayload::Interact { object: object.id },
            None => InputPayload::AdvanceTurn { reason: TurnReason::Wait },
        },
        6 | 7 => match choose(rng, &actors) {
            Some(actor) => match actor.kind {
                ActorKind::Enemy(_) if rng.next_u64() % 3 == 0 => {
                    InputPayload::TryPacify { actor: actor.id }
                }
                ActorKind::Enemy(_) => InputPayload::TalkToEnemy { actor: actor.id },
                ActorKind::Npc(_) => InputPayload::GetDialogue { actor: actor.id },
            },
            None => InputPayload::AdvanceTurn { reason: TurnReason::Rest },
        },
        8 => InputPayload::SpawnActor {
            kind: if rng.next_u64() % 2 == 0 { ActorKindTag::Npc } else { ActorKindTag::Enemy },
        },
        _ => InputPayload::AdvanceTurn { reason: TurnReason::Wait },
    }
}

#[derive(Default)]
struct Watch {
    cleared: BTreeSet<RoomId>,
    progress: BTreeMap<ActorId, u8>,
    cursor: u64,
    turn: u64,
}

impl Watch {
    fn check(&mut self, engine: &Engine<MemoryStore>, run: RunId) -> Result<(), String> {
        let state = engine.run(run).map_err(|err| err.to_string())?;
        let stats = state.stats;
        if !(STAT_MIN..=STAT_MAX).contains(&stats.health)
            || !(STAT_MIN..=STAT_MAX).contains(&stats.sanity)
            || !(MORALITY_MIN..=MORALITY_MAX).contains(&stats.morality)
        {
            return Err(format!("stats out of range: {stats:?}"));
        }
        if (stats.health == 0) != (state.status == RunStatus::Dead) {
            return Err(format!("health {} but status {:?}", stats.health, state.status));
        }
        if state.turn < self.turn {
            return Err("turn went backwards".to_string());
        }
        self.turn = state.turn;

        let store = engine.store();
        let rooms = store.rooms(run).map_err(|err| err.to_string())?;
        for room in &rooms {
            for (direction, target) in &room.exits {
                let other = store
                    .room(run, *target)
                    .map_err(|err| err.to_string())?
                    .ok_or_else(|| format!("room {} exits into nothing", room.id))?;
                if other.coord != room.coord.step(*direction)
                    || other.exit(direction.opposite()) != Some(room.id)
                {
                    return Err(format!("exit {direction:?} of room {} is one-way", room.id));
                }
            }
            if self.cleared.contains(&room.id) && !room.is_cleared {
                return Err(format!("room {} lost its cleared flag", room.id));
            }
        }

        let config = engine.run_config(run).map_err(|err| err.to_string())?;
        if config.world_gen_cursor < self.cursor {
            return Err("world-gen cursor went backwards".to_string());
        }
        self.cursor = config.world_gen_cursor;
        if let Some(cap) = config.max_rooms
            && rooms.len() > cap as usize
        {
            return Err(format!("{} rooms exceed the cap of {cap}", rooms.len()));
        }

        for actor in store.actors(run).map_err(|err| err.to_string())? {
            let Some(enemy) = actor.enemy() else { continue };
            let seen = self.progress.insert(actor.id, enemy.pacify_progress).unwrap_or(0);
            if enemy.pacify_progress < seen || enemy.pacify_progress > PACIFY_COMPLETE {
                return Err(format!("pacify progress of {} regressed", actor.id));
            }
            if enemy.pacified && actor.alive {
                return Err(format!("pacified enemy {} is still alive", actor.id));
            }
        }
        Ok(())
    }

    fn observe(&mut self, events: &[EventKind]) -> Result<(), String> {
        for event in events {
            match event {
                EventKind::Pacified { room, .. } => {
                    self.cleared.insert(*room);
                }
                EventKind::ActorSpawned { kind: ActorKindTag::Enemy, room, actor }
                    if self.cleared.contains(room) =>
                {
                    return Err(format!("enemy {actor} spawned in cleared room {room}"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn run_fuzz(seed: u64, difficulty: &str, choice_seed: u64, steps: usize) -> Result<(), String> {
    let mut engine =
        Engine::new(MemoryStore::new(), ContentCatalog::build_default(), Tuning::default())
            .map_err(|err| err.to_string())?;
    let run = engine
        .create_run(NewRun {
            seed: Some(seed),
            difficulty: difficulty.to_string(),
            player_name: "Ash".to_string(),
        })
        .map_err(|err| err.to_string())?
        .id;
    let mut rng = ChaCha8Rng::seed_from_u64(choice_seed);
    let mut watch = Watch::default();
    watch.check(&engine, run)?;

    for _ in 0..steps {
        let seen = engine.store().events(run).map_err(|err| err.to_string())?.len();
        let input = next_input(&engine, run, &mut rng);
        let before = engine.store().clone();
        match input.apply(&mut engine, run) {
            Ok(()) => {}
            Err(err) if err.is_rejection() => {
                if engine.store() != &before {
                    return Err(format!("rejected {input:?} still changed the store"));
                }
            }
            Err(err) => return Err(format!("engine failure on {input:?}: {err}")),
        }
        let events = engine.store().events(run).map_err(|err| err.to_string())?;
        let fresh: Vec<EventKind> = events[seen..].iter().map(|event| event.kind.clone()).collect();
        watch.observe(&fresh)?;
        watch.check(&engine, run)?;
    }
    Ok(())
}

#[test]
fn random_play_preserves_world_invariants() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(24));
    let cases = (any::<u64>(), any::<u64>(), select(vec!["story", "normal", "hard", "endless"]));

    runner
        .run(&cases, |(seed, choice_seed, difficulty)| {
            run_fuzz(seed, difficulty, choice_seed, 120).map_err(TestCaseError::fail)?;
            Ok(())
        })
        .expect("random play should preserve invariants");
}

#[test]
fn long_endless_walk_respects_the_room_cap() {
    run_fuzz(9001, "endless", 17, 600).expect("invariants");
}
