//! Rebuilds a run from its journal and fingerprints the result.

use thiserror::Error;
use tracing::debug;

use crate::composer::ComposeError;
use crate::content::ContentCatalog;
use crate::game::{ActionError, Engine, NewRun};
use crate::journal::InputJournal;
use crate::store::{MemoryStore, Store};
use crate::tuning::Tuning;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("journal was recorded against content {recorded:#018x}, loaded {loaded:#018x}")]
    ContentMismatch { recorded: u64, loaded: u64 },
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("replay engine failure: {0}")]
    Engine(#[from] ActionError),
    #[error("input {seq} was recorded at turn {recorded} but replay reached turn {reached}")]
    Diverged { seq: u64, recorded: u64, reached: u64 },
    #[error("input {seq} was rejected on replay: {source}")]
    Rejected {
        seq: u64,
        #[source]
        source: ActionError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub final_snapshot_hash: u64,
    pub final_turn: u64,
    pub room_count: usize,
    pub world_gen_cursor: u64,
}

/// Replays every input into a fresh in-memory store. A journal with a
/// zero content hash skips the content check.
pub fn replay_to_end(
    content: &ContentCatalog,
    tuning: &Tuning,
    journal: &InputJournal,
) -> Result<ReplayResult, ReplayError> {
    let loaded = content.content_hash();
    if journal.content_hash != 0 && journal.content_hash != loaded {
        return Err(ReplayError::ContentMismatch { recorded: journal.content_hash, loaded });
    }

    let mut engine = Engine::new(MemoryStore::new(), content.clone(), tuning.clone())?;
    let run = engine.create_run(NewRun {
        seed: Some(journal.seed),
        difficulty: journal.difficulty.clone(),
        player_name: journal.player_name.clone(),
    })?;

    for record in &journal.inputs {
        let reached = engine.run(run.id)?.turn;
        if reached != record.turn {
            return Err(ReplayError::Diverged { seq: record.seq, recorded: record.turn, reached });
        }
        record
            .payload
            .apply(&mut engine, run.id)
            .map_err(|source| ReplayError::Rejected { seq: record.seq, source })?;
    }

    let final_run = engine.run(run.id)?;
    let config = engine.run_config(run.id)?;
    let room_count = engine.store().room_count(run.id).map_err(ActionError::from)?;
    let result = ReplayResult {
        final_snapshot_hash: engine.snapshot_hash(run.id)?,
        final_turn: final_run.turn,
        room_count,
        world_gen_cursor: config.world_gen_cursor,
    };
    debug!(inputs = journal.inputs.len(), turn = result.final_turn, "replay finished");
    Ok(result)
}

#[cfg(test)]
mod tests;
