use std::collections::BTreeSet;
use std::io;

use anyhow::{Result, bail};
use clap::Parser;
use hollow_core::game::{Engine, NewRun};
use hollow_core::journal::InputPayload;
use hollow_core::state::{ActorKind, RunStatus};
use hollow_core::store::{MemoryStore, Store};
use hollow_core::types::{
    ActorKindTag, Direction, MORALITY_MAX, MORALITY_MIN, RoomId, RunId, STAT_MAX, STAT_MIN,
    TurnReason,
};
use hollow_tools::data::load_data;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    actions: u32,
    #[arg(short, long, default_value = "endless")]
    difficulty: String,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> Option<T> {
    if slice.is_empty() {
        return None;
    }
    Some(slice[rng.next_u64() as usize % slice.len()].clone())
}

fn next_input(engine: &Engine<MemoryStore>, run: RunId, rng: &mut ChaCha8Rng) -> InputPayload {
    let objects = engine.visible_objects(run).unwrap_or_default();
    let actors = engine.actors_here(run).unwrap_or_default();
    match rng.next_u64() % 12 {
        // Bias to walking so the frontier keeps growing
        0..5 => InputPayload::Move { direction: Direction::ALL[rng.next_u64() as usize % 4] },
        5 => InputPayload::Search,
        6 => match choose(rng, &objects) {
            Some(object) => InputPayload::Interact { object: object.id },
            None => InputPayload::Search,
        },
        7..9 => match choose(rng, &actors) {
            Some(actor) => match actor.kind {
                ActorKind::Enemy(_) if rng.next_u64() % 2 == 0 => {
                    InputPayload::TryPacify { actor: actor.id }
                }
                ActorKind::Enemy(_) => InputPayload::TalkToEnemy { actor: actor.id },
                ActorKind::Npc(_) => InputPayload::GetDialogue { actor: actor.id },
            },
            None => InputPayload::AdvanceTurn { reason: TurnReason::Wait },
        },
        9 => InputPayload::SpawnActor { kind: ActorKindTag::Enemy },
        10 => InputPayload::AdvanceTurn { reason: TurnReason::Rest },
        _ => InputPayload::AdvanceTurn { reason: TurnReason::Wait },
    }
}

fn check_invariants(
    engine: &Engine<MemoryStore>,
    run: RunId,
    cleared: &mut BTreeSet<RoomId>,
) -> Result<()> {
    let state = engine.run(run)?;
    let stats = state.stats;
    if !(STAT_MIN..=STAT_MAX).contains(&stats.health)
        || !(STAT_MIN..=STAT_MAX).contains(&stats.sanity)
        || !(MORALITY_MIN..=MORALITY_MAX).contains(&stats.morality)
    {
        bail!("stats escaped their range: {stats:?}");
    }
    if (stats.health == 0) != (state.status == RunStatus::Dead) {
        bail!("health {} disagrees with status {:?}", stats.health, state.status);
    }

    let store = engine.store();
    for room in store.rooms(run)? {
        for (direction, target) in &room.exits {
            let back = store.room(run, *target)?.and_then(|other| other.exit(direction.opposite()));
            if back != Some(room.id) {
                bail!("exit {direction} from room {} has no way back", room.id);
            }
        }
        if room.is_cleared {
            cleared.insert(room.id);
        } else if cleared.contains(&room.id) {
            bail!("room {} lost its cleared flag", room.id);
        }
    }
    for actor in store.actors(run)? {
        if let Some(enemy) = actor.enemy()
            && enemy.pacified
            && actor.alive
        {
            bail!("pacified actor {} is still alive", actor.id);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for {} actions...", args.seed, args.actions);
    let (content, tuning) = load_data(None, None)?;
    let mut engine = Engine::new(MemoryStore::new(), content, tuning)?;
    let run = engine
        .create_run(NewRun {
            seed: Some(args.seed),
            difficulty: args.difficulty.clone(),
            player_name: "Fuzz".to_string(),
        })?
        .id;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut cleared = BTreeSet::new();
    let mut rejected = 0_u32;

    for step in 0..args.actions {
        let input = next_input(&engine, run, &mut rng);
        let before = engine.store().snapshot();
        match input.apply(&mut engine, run) {
            Ok(()) => {}
            Err(err) if err.is_rejection() => {
                debug!(step, %err, "rejected");
                rejected += 1;
                if engine.store().snapshot() != before {
                    bail!("step {step}: rejected {input:?} still changed the world");
                }
            }
            Err(err) => return Err(err.into()),
        }
        check_invariants(&engine, run, &mut cleared)?;
        if engine.run(run)?.status == RunStatus::Dead {
            println!("Run died after {} actions", step + 1);
            break;
        }
    }

    let state = engine.run(run)?;
    println!(
        "Fuzz complete: turn {}, {} rooms, {} rejected inputs, hash {:#018x}",
        state.turn,
        engine.store().room_count(run)?,
        rejected,
        engine.snapshot_hash(run)?
    );
    Ok(())
}
