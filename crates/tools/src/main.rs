use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hollow_core::game::{ActionError, Engine, NewRun, Report};
use hollow_core::journal::{InputJournal, InputPayload};
use hollow_core::journal_file::{JournalWriter, load_journal_from_file};
use hollow_core::replay::replay_to_end;
use hollow_core::state::{Actor, Room, Run, RunConfig, WorldObject};
use hollow_core::store::{JsonFileStore, MemoryStore, Store};
use hollow_core::types::RunId;
use hollow_tools::data::load_data;
use hollow_tools::script::{format_command, parse_script};
use hollow_tools::seed::SeedChoice;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DataArgs {
    /// Content catalog TOML merged over the built-in catalog
    #[arg(long, global = true)]
    content: Option<PathBuf>,
    /// Tuning TOML replacing the built-in tuning
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a run and print its rooms and objects
    Generate {
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "normal")]
        difficulty: String,
        /// Print the stored rows as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Run a command script against a new run
    Play {
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "normal")]
        difficulty: String,
        #[arg(long, default_value = "Wanderer")]
        name: String,
        #[arg(long)]
        script: PathBuf,
        /// Record accepted commands to a JSONL journal
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Persist the world to a JSON store file instead of memory
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Replay a JSONL journal and print the final fingerprint
    Replay {
        #[arg(short, long)]
        journal: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (content, tuning) = load_data(cli.data.content.as_deref(), cli.data.tuning.as_deref())?;

    match cli.command {
        Command::Generate { seed, difficulty, json } => {
            let seed = SeedChoice::resolve(seed);
            let mut engine = Engine::new(MemoryStore::new(), content, tuning)?;
            let run = create_run(&mut engine, seed, &difficulty, "Wanderer")?;
            if json {
                let dump = WorldDump::collect(&engine, run)?;
                println!("{}", serde_json::to_string_pretty(&dump)?);
                Ok(())
            } else {
                print_world(&engine, run)
            }
        }
        Command::Play { seed, difficulty, name, script, journal, store } => {
            let seed = SeedChoice::resolve(seed);
            let commands = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let session = Session { seed, difficulty: &difficulty, name: &name, script: &commands };
            match store {
                Some(path) => {
                    let store = JsonFileStore::open(&path)
                        .with_context(|| format!("failed to open store {}", path.display()))?;
                    session.play(Engine::new(store, content, tuning)?, journal.as_deref())
                }
                None => {
                    let engine = Engine::new(MemoryStore::new(), content, tuning)?;
                    session.play(engine, journal.as_deref())
                }
            }
        }
        Command::Replay { journal } => {
            let loaded = load_journal_from_file(&journal)
                .with_context(|| format!("failed to load journal {}", journal.display()))?;
            let result = replay_to_end(&content, &tuning, &loaded.journal)
                .context("replay failed")?;
            println!("Replay complete.");
            println!("Inputs: {}", loaded.journal.inputs.len());
            println!("Final turn: {}", result.final_turn);
            println!("Rooms: {}", result.room_count);
            println!("World-gen cursor: {}", result.world_gen_cursor);
            println!("Snapshot hash: {:#018x}", result.final_snapshot_hash);
            Ok(())
        }
    }
}

fn create_run<S: Store>(
    engine: &mut Engine<S>,
    seed: SeedChoice,
    difficulty: &str,
    name: &str,
) -> Result<RunId> {
    if let SeedChoice::Generated(value) = seed {
        info!(seed = value, "no seed given, generated one");
    }
    let run = engine.create_run(NewRun {
        seed: Some(seed.value()),
        difficulty: difficulty.to_string(),
        player_name: name.to_string(),
    })?;
    info!(run = %run.id, seed = run.seed, difficulty = %run.difficulty, "run created");
    Ok(run.id)
}

#[derive(Serialize)]
struct WorldDump {
    run: Run,
    config: RunConfig,
    rooms: Vec<Room>,
    objects: Vec<WorldObject>,
    actors: Vec<Actor>,
}

impl WorldDump {
    fn collect<S: Store>(engine: &Engine<S>, run: RunId) -> Result<Self> {
        let store = engine.store();
        Ok(Self {
            run: engine.run(run)?,
            config: engine.run_config(run)?,
            rooms: store.rooms(run)?,
            objects: store.objects(run)?,
            actors: store.actors(run)?,
        })
    }
}

fn print_world<S: Store>(engine: &Engine<S>, run: RunId) -> Result<()> {
    let state = engine.run(run)?;
    println!("Run {} | seed {} | difficulty {}", state.id, state.seed, state.difficulty);
    let store = engine.store();
    for room in store.rooms(run)? {
        let exits: Vec<String> = room
            .exits
            .iter()
            .map(|(direction, target)| format!("{direction}->{target}"))
            .collect();
        let marker = if room.id == state.start_room { " (start)" } else { "" };
        println!(
            "room {:>3} {:>8} depth {:>2} danger {} {}{} [{}]",
            room.id.to_string(),
            room.coord.to_string(),
            room.depth,
            room.danger,
            room.name,
            marker,
            exits.join(" ")
        );
        for object in store.objects_in_room(run, room.id)? {
            let hidden = if object.hidden { " hidden" } else { "" };
            println!("    object {:>3} {}{}", object.id.to_string(), object.kind.label(), hidden);
        }
        for actor in store.actors_in_room(run, room.id)? {
            let id = actor.id.to_string();
            println!("    actor  {id:>3} {} ({})", actor.name, actor.archetype);
        }
    }
    Ok(())
}

struct Session<'a> {
    seed: SeedChoice,
    difficulty: &'a str,
    name: &'a str,
    script: &'a str,
}

impl Session<'_> {
    fn play<S: Store>(&self, mut engine: Engine<S>, journal: Option<&Path>) -> Result<()> {
        let commands = parse_script(self.script)?;
        let run = create_run(&mut engine, self.seed, self.difficulty, self.name)?;
        let mut writer = match journal {
            Some(path) => {
                let header = InputJournal::new(self.seed.value(), self.difficulty, self.name)
                    .with_content_hash(engine.content().content_hash());
                Some(
                    JournalWriter::create(path, &header)
                        .with_context(|| format!("failed to create journal {}", path.display()))?,
                )
            }
            None => None,
        };
        let state = engine.run(run)?;
        println!("Run {} | seed {} | difficulty {}", state.id, state.seed, state.difficulty);
        let room = engine.current_room(run)?;
        println!("You stand in {} at {}.", room.name, room.coord);

        for command in commands {
            let turn = engine.run(run)?.turn;
            println!("> {}", format_command(&command.payload));
            match apply(&mut engine, run, &command.payload) {
                Ok(report) => {
                    print_report(&report);
                    if let Some(writer) = writer.as_mut() {
                        writer.append(turn, &command.payload)?;
                    }
                }
                Err(err) if err.is_rejection() => {
                    warn!(line = command.line, %err, "command rejected");
                    println!("  ! {err}");
                }
                Err(err) => return Err(err).context(format!("script line {}", command.line)),
            }
        }

        let state = engine.run(run)?;
        println!(
            "Turn {} | health {} sanity {} morality {} | {:?}",
            state.turn, state.stats.health, state.stats.sanity, state.stats.morality, state.status
        );
        println!("Snapshot hash: {:#018x}", engine.snapshot_hash(run)?);
        Ok(())
    }
}

/// Runs one command, turning views and spawns into a printable report.
fn apply<S: Store>(
    engine: &mut Engine<S>,
    run: RunId,
    payload: &InputPayload,
) -> Result<Report, ActionError> {
    match payload {
        InputPayload::Move { direction } => engine.move_player(run, *direction),
        InputPayload::Search => engine.search_room(run),
        InputPayload::Interact { object } => engine.interact(run, *object),
        InputPayload::AdvanceTurn { reason } => engine.advance_turn(run, reason.clone()),
        InputPayload::SpawnActor { kind } => engine.spawn_actor(run, *kind).map(|actor| Report {
            messages: vec![format!(
                "{} ({}) appears as actor {}",
                actor.name, actor.archetype, actor.id
            )],
            ..Report::default()
        }),
        InputPayload::GetDialogue { actor } => engine.get_dialogue(run, *actor).map(|view| {
            let mut messages = vec![view.text];
            messages.extend(
                view.choices.iter().map(|choice| format!("[{}] {}", choice.key, choice.text)),
            );
            Report { messages, ..Report::default() }
        }),
        InputPayload::ChooseDialogue { actor, choice } => {
            engine.choose_dialogue(run, *actor, choice)
        }
        InputPayload::TalkToEnemy { actor } => engine.talk_to_enemy(run, *actor),
        InputPayload::TryPacify { actor } => engine.try_pacify(run, *actor),
    }
}

fn print_report(report: &Report) {
    for line in report.messages.iter().chain(&report.narration) {
        println!("  {line}");
    }
}
