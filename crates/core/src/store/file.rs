//! [`MemoryStore`] mirrored to a single JSON file after every write.

use std::fs;
use std::path::{Path, PathBuf};

use super::*;

pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let memory = if path.exists() {
            let text = fs::read_to_string(path)?;
            MemoryStore::from_snapshot(serde_json::from_str(&text)?)?
        } else {
            MemoryStore::new()
        };
        Ok(Self { path: path.to_path_buf(), memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(&self.memory.snapshot())?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn write<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let value = change(&mut self.memory)?;
        self.persist()?;
        Ok(value)
    }
}

impl Store for JsonFileStore {
    fn next_id(&self, table: Table) -> Result<u64, StoreError> {
        self.memory.next_id(table)
    }

    fn allocate_id(&mut self, table: Table) -> Result<u64, StoreError> {
        self.write(|memory| memory.allocate_id(table))
    }

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        self.memory.run(id)
    }

    fn put_run(&mut self, run: Run) -> Result<(), StoreError> {
        self.write(|memory| memory.put_run(run))
    }

    fn run_config(&self, id: RunId) -> Result<Option<RunConfig>, StoreError> {
        self.memory.run_config(id)
    }

    fn put_run_config(&mut self, config: RunConfig) -> Result<(), StoreError> {
        self.write(|memory| memory.put_run_config(config))
    }

    fn room(&self, run: RunId, id: RoomId) -> Result<Option<Room>, StoreError> {
        self.memory.room(run, id)
    }

    fn room_at(&self, run: RunId, coord: Coord) -> Result<Option<Room>, StoreError> {
        self.memory.room_at(run, coord)
    }

    fn rooms(&self, run: RunId) -> Result<Vec<Room>, StoreError> {
        self.memory.rooms(run)
    }

    fn put_room(&mut self, room: Room) -> Result<(), StoreError> {
        self.write(|memory| memory.put_room(room))
    }

    fn object(&self, run: RunId, id: ObjectId) -> Result<Option<WorldObject>, StoreError> {
        self.memory.object(run, id)
    }

    fn objects(&self, run: RunId) -> Result<Vec<WorldObject>, StoreError> {
        self.memory.objects(run)
    }

    fn put_object(&mut self, object: WorldObject) -> Result<(), StoreError> {
        self.write(|memory| memory.put_object(object))
    }

    fn actor(&self, run: RunId, id: ActorId) -> Result<Option<Actor>, StoreError> {
        self.memory.actor(run, id)
    }

    fn actors(&self, run: RunId) -> Result<Vec<Actor>, StoreError> {
        self.memory.actors(run)
    }

    fn put_actor(&mut self, actor: Actor) -> Result<(), StoreError> {
        self.write(|memory| memory.put_actor(actor))
    }

    fn conversation(
        &self,
        run: RunId,
        actor: ActorId,
    ) -> Result<Option<ConversationState>, StoreError> {
        self.memory.conversation(run, actor)
    }

    fn put_conversation(&mut self, state: ConversationState) -> Result<(), StoreError> {
        self.write(|memory| memory.put_conversation(state))
    }

    fn remove_conversation(&mut self, run: RunId, actor: ActorId) -> Result<(), StoreError> {
        self.write(|memory| memory.remove_conversation(run, actor))
    }

    fn append_event(&mut self, event: RunEvent) -> Result<(), StoreError> {
        self.write(|memory| memory.append_event(event))
    }

    fn events(&self, run: RunId) -> Result<Vec<RunEvent>, StoreError> {
        self.memory.events(run)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        self.write(|memory| memory.apply(batch))
    }
}
