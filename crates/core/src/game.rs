//! Action surface of the simulation core.
//!
//! Each player action opens an [`ActionContext`] over a store transaction,
//! runs its fixed sequence of effects, and commits the buffered writes only
//! when every step succeeded.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info};

use crate::composer::{ComposeError, ComposeRequest, Composer, Placeholders};
use crate::content::{ActorArchetype, ContentCatalog, DifficultyProfile};
use crate::mapgen::{
    MAX_DANGER, RoomRequest, Solvability, build_room, generate_world, roll_trap,
};
use crate::rng::{KeyedRng, Purpose, coord_scope, derive_run_seed, mix_seed_stream};
use crate::state::*;
use crate::store::{Store, StoreError, Table, Transaction, WriteBatch};
use crate::tuning::{AtmosphereTuning, Tuning};
use crate::types::*;

mod actors;
mod atmosphere;
mod context;
mod dialogue;
mod error;
mod frontier;
mod hash;
mod interact;
mod movement;
mod pacify;
mod search;

use context::{ActionContext, Env};

pub use dialogue::{ChoiceView, DialogueView};
pub use error::{ActionError, NotFound, Precondition};
pub use frontier::FrontierOutcome;
pub use pacify::{PACIFY_COMPLETE, pacify_cost, pacify_gain, speech_level};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRun {
    pub seed: Option<u64>,
    pub difficulty: String,
    pub player_name: String,
}

/// What an action did, in the order it happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub turn: u64,
    pub messages: Vec<String>,
    pub narration: Vec<String>,
    pub events: Vec<EventKind>,
}

pub struct Engine<S: Store> {
    store: S,
    content: ContentCatalog,
    tuning: Tuning,
    placeholders: Placeholders,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, content: ContentCatalog, tuning: Tuning) -> Result<Self, ComposeError> {
        Ok(Self { store, content, tuning, placeholders: Placeholders::compile()? })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn content(&self) -> &ContentCatalog {
        &self.content
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    fn env(&self) -> Env<'_> {
        Env { content: &self.content, tuning: &self.tuning, placeholders: &self.placeholders }
    }

    fn commit(&mut self, run_id: RunId, batch: WriteBatch) -> Result<(), ActionError> {
        let writes = batch.events.len();
        self.store.apply(batch)?;
        debug!(run = %run_id, events = writes, "action committed");
        Ok(())
    }

    /// Runs one action inside a transaction; nothing is written unless it succeeds.
    fn act<T>(
        &mut self,
        run_id: RunId,
        action: impl FnOnce(&mut ActionContext<'_>) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let (value, batch) = {
            let mut context =
                ActionContext::open(Transaction::new(&self.store), self.env(), run_id)?;
            context.ensure_active()?;
            let value = action(&mut context)?;
            (value, context.finish()?)
        };
        self.commit(run_id, batch)?;
        Ok(value)
    }

    pub fn create_run(&mut self, new_run: NewRun) -> Result<Run, ActionError> {
        let env = self.env();
        let profile = env
            .content
            .difficulty(&new_run.difficulty)
            .ok_or_else(|| NotFound::Difficulty(new_run.difficulty.clone()))?;

        let (run, batch) = {
            let mut tx = Transaction::new(&self.store);
            let run_id = RunId(tx.allocate_id(Table::Run)?);
            let seed = new_run.seed.unwrap_or_else(|| derive_run_seed(run_id.0));
            let packs = profile.content_packs.clone();
            let world = generate_world(seed, &packs, env.content, &env.tuning.world);

            let mut room_ids = Vec::with_capacity(world.rooms.len());
            for _ in &world.rooms {
                room_ids.push(RoomId(tx.allocate_id(Table::Room)?));
            }
            for (index, generated) in world.rooms.iter().enumerate() {
                tx.put_room(Room {
                    id: room_ids[index],
                    run_id,
                    coord: generated.coord,
                    depth: generated.depth,
                    danger: generated.danger,
                    name: generated.name.clone(),
                    theme: generated.theme.clone(),
                    tags: generated.tags.clone(),
                    exits: generated
                        .exits
                        .iter()
                        .map(|(direction, target)| (*direction, room_ids[*target]))
                        .collect(),
                    has_been_searched: false,
                    is_cleared: false,
                    frontier_added: 0,
                    frontier_grown: false,
                })?;
            }
            for generated in &world.objects {
                let id = ObjectId(tx.allocate_id(Table::Object)?);
                tx.put_object(WorldObject {
                    id,
                    run_id,
                    room_id: room_ids[generated.room],
                    hidden: generated.hidden,
                    kind: generated.kind.clone(),
                })?;
            }

            let start = room_ids[world.start];
            tx.put_run(Run {
                id: run_id,
                seed,
                difficulty: profile.key.clone(),
                player_name: new_run.player_name.clone(),
                start_room: start,
                current_room: start,
                turn: 0,
                stats: PlayerStats::default(),
                inventory: BTreeMap::new(),
                status: RunStatus::Active,
            })?;
            tx.put_run_config(RunConfig {
                run_id,
                endless: profile.endless,
                max_rooms: profile.max_rooms,
                ring_radius: profile.ring_radius,
                rooms_per_turn: profile.rooms_per_turn,
                content_packs: packs,
                world_gen_cursor: 0,
            })?;

            let mut context = ActionContext::open(tx, env, run_id)?;
            context.log(EventKind::RunCreated {
                seed,
                difficulty: profile.key.clone(),
                rooms: world.rooms.len() as u32,
            })?;
            context.expand_frontier()?;
            context.top_up_current_room()?;
            let run = context.run().clone();
            (run, context.finish()?)
        };

        self.commit(run.id, batch)?;
        info!(run = %run.id, seed = run.seed, difficulty = %run.difficulty, "run created");
        Ok(run)
    }

    pub fn run(&self, run_id: RunId) -> Result<Run, ActionError> {
        Ok(self.store.run(run_id)?.ok_or(NotFound::Run(run_id))?)
    }

    pub fn run_config(&self, run_id: RunId) -> Result<RunConfig, ActionError> {
        Ok(self.store.run_config(run_id)?.ok_or(NotFound::RunConfig(run_id))?)
    }

    pub fn current_room(&self, run_id: RunId) -> Result<Room, ActionError> {
        let run = self.run(run_id)?;
        Ok(self.store.room(run_id, run.current_room)?.ok_or(NotFound::Room(run.current_room))?)
    }

    /// Objects in the player's room that are not hidden.
    pub fn visible_objects(&self, run_id: RunId) -> Result<Vec<WorldObject>, ActionError> {
        let run = self.run(run_id)?;
        let objects = self.store.objects_in_room(run_id, run.current_room)?;
        Ok(objects.into_iter().filter(|object| !object.hidden).collect())
    }

    pub fn actors_here(&self, run_id: RunId) -> Result<Vec<Actor>, ActionError> {
        let run = self.run(run_id)?;
        let actors = self.store.actors_in_room(run_id, run.current_room)?;
        Ok(actors.into_iter().filter(|actor| actor.alive).collect())
    }

    pub fn move_player(&mut self, run: RunId, direction: Direction) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.move_player(direction)?;
            Ok(context.take_report())
        })
    }

    pub fn search_room(&mut self, run: RunId) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.search_room()?;
            Ok(context.take_report())
        })
    }

    pub fn interact(&mut self, run: RunId, object: ObjectId) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.interact(object)?;
            Ok(context.take_report())
        })
    }

    pub fn advance_turn(&mut self, run: RunId, reason: TurnReason) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.begin_turn();
            context.log(EventKind::TurnAdvanced { reason })?;
            context.end_turn(false)?;
            Ok(context.take_report())
        })
    }

    /// Debug hook: spawns in the player's room ignoring caps.
    pub fn spawn_actor(&mut self, run: RunId, kind: ActorKindTag) -> Result<Actor, ActionError> {
        self.act(run, |context| context.spawn_requested(kind))
    }

    pub fn get_dialogue(
        &mut self,
        run: RunId,
        actor: ActorId,
    ) -> Result<DialogueView, ActionError> {
        self.act(run, |context| context.get_dialogue(actor))
    }

    pub fn choose_dialogue(
        &mut self,
        run: RunId,
        actor: ActorId,
        choice: &str,
    ) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.choose_dialogue(actor, choice)?;
            Ok(context.take_report())
        })
    }

    pub fn talk_to_enemy(&mut self, run: RunId, actor: ActorId) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.talk_to_enemy(actor)?;
            Ok(context.take_report())
        })
    }

    pub fn try_pacify(&mut self, run: RunId, actor: ActorId) -> Result<Report, ActionError> {
        self.act(run, |context| {
            context.try_pacify(actor)?;
            Ok(context.take_report())
        })
    }
}

#[cfg(test)]
mod test_support;
