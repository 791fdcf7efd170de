//! Stable snapshot hashing for deterministic verification.

use std::hash::Hasher;

use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use super::*;

fn write_row<T: Serialize>(hasher: &mut Xxh3, row: &T) -> Result<(), ActionError> {
    let bytes = serde_json::to_vec(row).map_err(StoreError::from)?;
    hasher.write_u64(bytes.len() as u64);
    hasher.write(&bytes);
    Ok(())
}

impl<S: Store> Engine<S> {
    /// Fingerprint of everything a run's future depends on. Events and
    /// conversation scratch state are excluded.
    pub fn snapshot_hash(&self, run_id: RunId) -> Result<u64, ActionError> {
        let mut hasher = Xxh3::new();
        write_row(&mut hasher, &self.run(run_id)?)?;
        write_row(&mut hasher, &self.run_config(run_id)?)?;
        for room in self.store.rooms(run_id)? {
            write_row(&mut hasher, &room)?;
        }
        for object in self.store.objects(run_id)? {
            write_row(&mut hasher, &object)?;
        }
        for actor in self.store.actors(run_id)? {
            write_row(&mut hasher, &actor)?;
        }
        Ok(hasher.finish())
    }
}
