//! Accepted player inputs, in order. Replaying them against the same seed,
//! content and tuning rebuilds the run exactly.

use serde::{Deserialize, Serialize};

use crate::game::{ActionError, Engine};
use crate::store::Store;
use crate::types::{ActorId, ActorKindTag, Direction, ObjectId, RunId, TurnReason};

pub const JOURNAL_FORMAT_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub build_id: String,
    pub content_hash: u64,
    pub seed: u64,
    pub difficulty: String,
    pub player_name: String,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    /// Run turn when the input was accepted.
    pub turn: u64,
    pub payload: InputPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InputPayload {
    Move { direction: Direction },
    Search,
    Interact { object: ObjectId },
    AdvanceTurn { reason: TurnReason },
    SpawnActor { kind: ActorKindTag },
    GetDialogue { actor: ActorId },
    ChooseDialogue { actor: ActorId, choice: String },
    TalkToEnemy { actor: ActorId },
    TryPacify { actor: ActorId },
}

impl InputPayload {
    /// Drives the matching engine action. Reports are dropped; only the
    /// committed state matters for replay.
    pub fn apply<S: Store>(&self, engine: &mut Engine<S>, run: RunId) -> Result<(), ActionError> {
        match self {
            Self::Move { direction } => engine.move_player(run, *direction).map(drop),
            Self::Search => engine.search_room(run).map(drop),
            Self::Interact { object } => engine.interact(run, *object).map(drop),
            Self::AdvanceTurn { reason } => engine.advance_turn(run, reason.clone()).map(drop),
            Self::SpawnActor { kind } => engine.spawn_actor(run, *kind).map(drop),
            Self::GetDialogue { actor } => engine.get_dialogue(run, *actor).map(drop),
            Self::ChooseDialogue { actor, choice } => {
                engine.choose_dialogue(run, *actor, choice).map(drop)
            }
            Self::TalkToEnemy { actor } => engine.talk_to_enemy(run, *actor).map(drop),
            Self::TryPacify { actor } => engine.try_pacify(run, *actor).map(drop),
        }
    }
}

impl InputJournal {
    pub fn new(seed: u64, difficulty: &str, player_name: &str) -> Self {
        Self {
            format_version: JOURNAL_FORMAT_VERSION,
            build_id: "dev".to_string(),
            content_hash: 0,
            seed,
            difficulty: difficulty.to_string(),
            player_name: player_name.to_string(),
            inputs: Vec::new(),
        }
    }

    pub fn with_content_hash(mut self, content_hash: u64) -> Self {
        self.content_hash = content_hash;
        self
    }

    pub fn append(&mut self, turn: u64, payload: InputPayload) {
        let seq = self.inputs.len() as u64;
        self.inputs.push(InputRecord { seq, turn, payload });
    }
}
