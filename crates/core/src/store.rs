//! Storage collaborator contract, an in-memory implementation with a JSON
//! file mirror, and a write-buffering transaction overlay.
//!
//! Every action runs against a [`Transaction`]; its [`WriteBatch`] is applied
//! to the backing store only when the action succeeds, so rejected or failed
//! actions never leave partial writes behind.

use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::*;
use crate::types::*;

mod file;

pub use file::JsonFileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Run,
    Room,
    Object,
    Actor,
    Event,
}

pub trait Store {
    /// Identifier the next `allocate_id` call on this table would return.
    fn next_id(&self, table: Table) -> Result<u64, StoreError>;
    fn allocate_id(&mut self, table: Table) -> Result<u64, StoreError>;

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError>;
    fn put_run(&mut self, run: Run) -> Result<(), StoreError>;
    fn run_config(&self, id: RunId) -> Result<Option<RunConfig>, StoreError>;
    fn put_run_config(&mut self, config: RunConfig) -> Result<(), StoreError>;

    fn room(&self, run: RunId, id: RoomId) -> Result<Option<Room>, StoreError>;
    fn room_at(&self, run: RunId, coord: Coord) -> Result<Option<Room>, StoreError>;
    fn rooms(&self, run: RunId) -> Result<Vec<Room>, StoreError>;
    fn put_room(&mut self, room: Room) -> Result<(), StoreError>;

    fn object(&self, run: RunId, id: ObjectId) -> Result<Option<WorldObject>, StoreError>;
    fn objects(&self, run: RunId) -> Result<Vec<WorldObject>, StoreError>;
    fn put_object(&mut self, object: WorldObject) -> Result<(), StoreError>;

    fn actor(&self, run: RunId, id: ActorId) -> Result<Option<Actor>, StoreError>;
    fn actors(&self, run: RunId) -> Result<Vec<Actor>, StoreError>;
    fn put_actor(&mut self, actor: Actor) -> Result<(), StoreError>;

    fn conversation(
        &self,
        run: RunId,
        actor: ActorId,
    ) -> Result<Option<ConversationState>, StoreError>;
    fn put_conversation(&mut self, state: ConversationState) -> Result<(), StoreError>;
    fn remove_conversation(&mut self, run: RunId, actor: ActorId) -> Result<(), StoreError>;

    fn append_event(&mut self, event: RunEvent) -> Result<(), StoreError>;
    fn events(&self, run: RunId) -> Result<Vec<RunEvent>, StoreError>;

    /// Applies a committed batch atomically.
    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError>;

    fn objects_in_room(&self, run: RunId, room: RoomId) -> Result<Vec<WorldObject>, StoreError> {
        Ok(self.objects(run)?.into_iter().filter(|object| object.room_id == room).collect())
    }

    fn actors_in_room(&self, run: RunId, room: RoomId) -> Result<Vec<Actor>, StoreError> {
        Ok(self.actors(run)?.into_iter().filter(|actor| actor.room_id == room).collect())
    }

    fn room_count(&self, run: RunId) -> Result<usize, StoreError> {
        Ok(self.rooms(run)?.len())
    }
}

/// Buffered writes of one action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    pub next_ids: BTreeMap<Table, u64>,
    pub runs: BTreeMap<RunId, Run>,
    pub configs: BTreeMap<RunId, RunConfig>,
    pub rooms: BTreeMap<RoomId, Room>,
    pub objects: BTreeMap<ObjectId, WorldObject>,
    pub actors: BTreeMap<ActorId, Actor>,
    /// `None` marks a removal.
    pub conversations: BTreeMap<(RunId, ActorId), Option<ConversationState>>,
    pub events: Vec<RunEvent>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.next_ids.is_empty()
            && self.runs.is_empty()
            && self.configs.is_empty()
            && self.rooms.is_empty()
            && self.objects.is_empty()
            && self.actors.is_empty()
            && self.conversations.is_empty()
            && self.events.is_empty()
    }
}

/// Ordered in-memory tables; iteration order is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    next_ids: BTreeMap<Table, u64>,
    runs: BTreeMap<RunId, Run>,
    configs: BTreeMap<RunId, RunConfig>,
    rooms: BTreeMap<RoomId, Room>,
    room_index: BTreeMap<(RunId, Coord), RoomId>,
    objects: BTreeMap<ObjectId, WorldObject>,
    actors: BTreeMap<ActorId, Actor>,
    conversations: BTreeMap<(RunId, ActorId), ConversationState>,
    events: Vec<RunEvent>,
}

/// Flat, serializable image of a [`MemoryStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub next_ids: Vec<(Table, u64)>,
    pub runs: Vec<Run>,
    pub configs: Vec<RunConfig>,
    pub rooms: Vec<Room>,
    pub objects: Vec<WorldObject>,
    pub actors: Vec<Actor>,
    pub conversations: Vec<ConversationState>,
    pub events: Vec<RunEvent>,
}

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_ids: self.next_ids.iter().map(|(table, id)| (*table, *id)).collect(),
            runs: self.runs.values().cloned().collect(),
            configs: self.configs.values().cloned().collect(),
            rooms: self.rooms.values().cloned().collect(),
            objects: self.objects.values().cloned().collect(),
            actors: self.actors.values().cloned().collect(),
            conversations: self.conversations.values().cloned().collect(),
            events: self.events.clone(),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported snapshot format {}",
                snapshot.format_version
            )));
        }
        let mut store =
            Self { next_ids: snapshot.next_ids.into_iter().collect(), ..Self::default() };
        for run in snapshot.runs {
            store.runs.insert(run.id, run);
        }
        for config in snapshot.configs {
            store.configs.insert(config.run_id, config);
        }
        for room in snapshot.rooms {
            store.insert_room(room)?;
        }
        for object in snapshot.objects {
            store.objects.insert(object.id, object);
        }
        for actor in snapshot.actors {
            store.actors.insert(actor.id, actor);
        }
        for state in snapshot.conversations {
            store.conversations.insert((state.run_id, state.actor_id), state);
        }
        store.events = snapshot.events;
        Ok(store)
    }

    fn insert_room(&mut self, room: Room) -> Result<(), StoreError> {
        let index_key = (room.run_id, room.coord);
        if let Some(existing) = self.room_index.get(&index_key)
            && *existing != room.id
        {
            return Err(StoreError::Corrupt(format!(
                "room {} and room {} share coordinate {}",
                existing, room.id, room.coord
            )));
        }
        self.room_index.insert(index_key, room.id);
        self.rooms.insert(room.id, room);
        Ok(())
    }
}

impl Store for MemoryStore {
    fn next_id(&self, table: Table) -> Result<u64, StoreError> {
        Ok(self.next_ids.get(&table).copied().unwrap_or(1))
    }

    fn allocate_id(&mut self, table: Table) -> Result<u64, StoreError> {
        let id = self.next_id(table)?;
        self.next_ids.insert(table, id + 1);
        Ok(id)
    }

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.runs.get(&id).cloned())
    }

    fn put_run(&mut self, run: Run) -> Result<(), StoreError> {
        self.runs.insert(run.id, run);
        Ok(())
    }

    fn run_config(&self, id: RunId) -> Result<Option<RunConfig>, StoreError> {
        Ok(self.configs.get(&id).cloned())
    }

    fn put_run_config(&mut self, config: RunConfig) -> Result<(), StoreError> {
        self.configs.insert(config.run_id, config);
        Ok(())
    }

    fn room(&self, run: RunId, id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(&id).filter(|room| room.run_id == run).cloned())
    }

    fn room_at(&self, run: RunId, coord: Coord) -> Result<Option<Room>, StoreError> {
        Ok(self.room_index.get(&(run, coord)).and_then(|id| self.rooms.get(id)).cloned())
    }

    fn rooms(&self, run: RunId) -> Result<Vec<Room>, StoreError> {
        Ok(self.rooms.values().filter(|room| room.run_id == run).cloned().collect())
    }

    fn put_room(&mut self, room: Room) -> Result<(), StoreError> {
        self.insert_room(room)
    }

    fn object(&self, run: RunId, id: ObjectId) -> Result<Option<WorldObject>, StoreError> {
        Ok(self.objects.get(&id).filter(|object| object.run_id == run).cloned())
    }

    fn objects(&self, run: RunId) -> Result<Vec<WorldObject>, StoreError> {
        Ok(self.objects.values().filter(|object| object.run_id == run).cloned().collect())
    }

    fn put_object(&mut self, object: WorldObject) -> Result<(), StoreError> {
        self.objects.insert(object.id, object);
        Ok(())
    }

    fn actor(&self, run: RunId, id: ActorId) -> Result<Option<Actor>, StoreError> {
        Ok(self.actors.get(&id).filter(|actor| actor.run_id == run).cloned())
    }

    fn actors(&self, run: RunId) -> Result<Vec<Actor>, StoreError> {
        Ok(self.actors.values().filter(|actor| actor.run_id == run).cloned().collect())
    }

    fn put_actor(&mut self, actor: Actor) -> Result<(), StoreError> {
        self.actors.insert(actor.id, actor);
        Ok(())
    }

    fn conversation(
        &self,
        run: RunId,
        actor: ActorId,
    ) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.conversations.get(&(run, actor)).cloned())
    }

    fn put_conversation(&mut self, state: ConversationState) -> Result<(), StoreError> {
        self.conversations.insert((state.run_id, state.actor_id), state);
        Ok(())
    }

    fn remove_conversation(&mut self, run: RunId, actor: ActorId) -> Result<(), StoreError> {
        self.conversations.remove(&(run, actor));
        Ok(())
    }

    fn append_event(&mut self, event: RunEvent) -> Result<(), StoreError> {
        self.events.push(event);
        Ok(())
    }

    fn events(&self, run: RunId) -> Result<Vec<RunEvent>, StoreError> {
        Ok(self.events.iter().filter(|event| event.run_id == run).cloned().collect())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        // Validate coordinate uniqueness before touching anything.
        let mut staged_index = self.room_index.clone();
        for room in batch.rooms.values() {
            let index_key = (room.run_id, room.coord);
            match staged_index.get(&index_key) {
                Some(existing) if *existing != room.id => {
                    return Err(StoreError::Corrupt(format!(
                        "room {} and room {} share coordinate {}",
                        existing, room.id, room.coord
                    )));
                }
                _ => {
                    staged_index.insert(index_key, room.id);
                }
            }
        }

        for (table, next) in batch.next_ids {
            let current = self.next_ids.entry(table).or_insert(1);
            *current = (*current).max(next);
        }
        self.runs.extend(batch.runs);
        self.configs.extend(batch.configs);
        self.rooms.extend(batch.rooms);
        self.room_index = staged_index;
        self.objects.extend(batch.objects);
        self.actors.extend(batch.actors);
        for (key, state) in batch.conversations {
            match state {
                Some(state) => {
                    self.conversations.insert(key, state);
                }
                None => {
                    self.conversations.remove(&key);
                }
            }
        }
        self.events.extend(batch.events);
        Ok(())
    }
}

/// Read-through overlay that buffers every write into a [`WriteBatch`].
pub struct Transaction<'a> {
    base: &'a dyn Store,
    batch: WriteBatch,
}

impl<'a> Transaction<'a> {
    pub fn new(base: &'a dyn Store) -> Self {
        Self { base, batch: WriteBatch::default() }
    }

    pub fn into_batch(self) -> WriteBatch {
        self.batch
    }
}

fn overlay<K: Ord + Copy, T: Clone>(
    base: Vec<T>,
    staged: &BTreeMap<K, T>,
    key_of: impl Fn(&T) -> K,
    keep: impl Fn(&T) -> bool,
) -> Vec<T> {
    let mut merged: BTreeMap<K, T> = base.into_iter().map(|row| (key_of(&row), row)).collect();
    for (key, row) in staged {
        if keep(row) {
            merged.insert(*key, row.clone());
        }
    }
    merged.into_values().collect()
}

impl Store for Transaction<'_> {
    fn next_id(&self, table: Table) -> Result<u64, StoreError> {
        match self.batch.next_ids.get(&table) {
            Some(next) => Ok(*next),
            None => self.base.next_id(table),
        }
    }

    fn allocate_id(&mut self, table: Table) -> Result<u64, StoreError> {
        let id = self.next_id(table)?;
        self.batch.next_ids.insert(table, id + 1);
        Ok(id)
    }

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        match self.batch.runs.get(&id) {
            Some(run) => Ok(Some(run.clone())),
            None => self.base.run(id),
        }
    }

    fn put_run(&mut self, run: Run) -> Result<(), StoreError> {
        self.batch.runs.insert(run.id, run);
        Ok(())
    }

    fn run_config(&self, id: RunId) -> Result<Option<RunConfig>, StoreError> {
        match self.batch.configs.get(&id) {
            Some(config) => Ok(Some(config.clone())),
            None => self.base.run_config(id),
        }
    }

    fn put_run_config(&mut self, config: RunConfig) -> Result<(), StoreError> {
        self.batch.configs.insert(config.run_id, config);
        Ok(())
    }

    fn room(&self, run: RunId, id: RoomId) -> Result<Option<Room>, StoreError> {
        match self.batch.rooms.get(&id) {
            Some(room) if room.run_id == run => Ok(Some(room.clone())),
            Some(_) => Ok(None),
            None => self.base.room(run, id),
        }
    }

    fn room_at(&self, run: RunId, coord: Coord) -> Result<Option<Room>, StoreError> {
        if let Some(room) =
            self.batch.rooms.values().find(|room| room.run_id == run && room.coord == coord)
        {
            return Ok(Some(room.clone()));
        }
        self.base.room_at(run, coord)
    }

    fn rooms(&self, run: RunId) -> Result<Vec<Room>, StoreError> {
        Ok(overlay(self.base.rooms(run)?, &self.batch.rooms, |room| room.id, |room| {
            room.run_id == run
        }))
    }

    fn put_room(&mut self, room: Room) -> Result<(), StoreError> {
        if let Some(existing) = self.room_at(room.run_id, room.coord)?
            && existing.id != room.id
        {
            return Err(StoreError::Corrupt(format!(
                "room {} and room {} share coordinate {}",
                existing.id, room.id, room.coord
            )));
        }
        self.batch.rooms.insert(room.id, room);
        Ok(())
    }

    fn object(&self, run: RunId, id: ObjectId) -> Result<Option<WorldObject>, StoreError> {
        match self.batch.objects.get(&id) {
            Some(object) if object.run_id == run => Ok(Some(object.clone())),
            Some(_) => Ok(None),
            None => self.base.object(run, id),
        }
    }

    fn objects(&self, run: RunId) -> Result<Vec<WorldObject>, StoreError> {
        Ok(overlay(self.base.objects(run)?, &self.batch.objects, |object| object.id, |object| {
            object.run_id == run
        }))
    }

    fn put_object(&mut self, object: WorldObject) -> Result<(), StoreError> {
        self.batch.objects.insert(object.id, object);
        Ok(())
    }

    fn actor(&self, run: RunId, id: ActorId) -> Result<Option<Actor>, StoreError> {
        match self.batch.actors.get(&id) {
            Some(actor) if actor.run_id == run => Ok(Some(actor.clone())),
            Some(_) => Ok(None),
            None => self.base.actor(run, id),
        }
    }

    fn actors(&self, run: RunId) -> Result<Vec<Actor>, StoreError> {
        Ok(overlay(self.base.actors(run)?, &self.batch.actors, |actor| actor.id, |actor| {
            actor.run_id == run
        }))
    }

    fn put_actor(&mut self, actor: Actor) -> Result<(), StoreError> {
        self.batch.actors.insert(actor.id, actor);
        Ok(())
    }

    fn conversation(
        &self,
        run: RunId,
        actor: ActorId,
    ) -> Result<Option<ConversationState>, StoreError> {
        match self.batch.conversations.get(&(run, actor)) {
            Some(staged) => Ok(staged.clone()),
            None => self.base.conversation(run, actor),
        }
    }

    fn put_conversation(&mut self, state: ConversationState) -> Result<(), StoreError> {
        self.batch.conversations.insert((state.run_id, state.actor_id), Some(state));
        Ok(())
    }

    fn remove_conversation(&mut self, run: RunId, actor: ActorId) -> Result<(), StoreError> {
        self.batch.conversations.insert((run, actor), None);
        Ok(())
    }

    fn append_event(&mut self, event: RunEvent) -> Result<(), StoreError> {
        self.batch.events.push(event);
        Ok(())
    }

    fn events(&self, run: RunId) -> Result<Vec<RunEvent>, StoreError> {
        let mut events = self.base.events(run)?;
        events.extend(self.batch.events.iter().filter(|event| event.run_id == run).cloned());
        Ok(events)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for (table, next) in batch.next_ids {
            let current = self.next_id(table)?;
            self.batch.next_ids.insert(table, current.max(next));
        }
        self.batch.runs.extend(batch.runs);
        self.batch.configs.extend(batch.configs);
        for room in batch.rooms.into_values() {
            self.put_room(room)?;
        }
        self.batch.objects.extend(batch.objects);
        self.batch.actors.extend(batch.actors);
        self.batch.conversations.extend(batch.conversations);
        self.batch.events.extend(batch.events);
        Ok(())
    }
}
