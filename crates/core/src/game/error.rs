//! Rejection taxonomy for player actions. Every rejection leaves the store untouched.

use thiserror::Error;

use crate::store::StoreError;
use crate::types::{ActorId, Direction, ObjectId, RoomId, RunId};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Precondition(#[from] Precondition),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl ActionError {
    /// True for rejections the player caused, as opposed to storage failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("run {0} does not exist")]
    Run(RunId),
    #[error("run {0} has no configuration")]
    RunConfig(RunId),
    #[error("room {0} does not exist")]
    Room(RoomId),
    #[error("there is no object {0}")]
    Object(ObjectId),
    #[error("there is no one called {0}")]
    Actor(ActorId),
    #[error("difficulty '{0}' is not defined")]
    Difficulty(String),
    #[error("dialogue node '{0}' is not defined")]
    DialogueNode(String),
    #[error("no dialogue is available")]
    DialogueRoot,
    #[error("'{0}' is not a choice here")]
    Choice(String),
    #[error("you are not talking with {0}")]
    Conversation(ActorId),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("the run is over")]
    RunOver,
    #[error("there is no way {0}")]
    NoExit(Direction),
    #[error("a sealed gate blocks the way {direction}")]
    GateSealed { direction: Direction, required_key: Option<String> },
    #[error("you have already searched this room")]
    RoomAlreadySearched,
    #[error("object {0} is not in this room")]
    ObjectNotHere(ObjectId),
    #[error("there is no object {0}")]
    ObjectHidden(ObjectId),
    #[error("there is nothing left to take")]
    ItemAlreadyTaken,
    #[error("the chest is already open")]
    ChestAlreadyOpened,
    #[error("you need the {0}")]
    MissingKey(String),
    #[error("the gate is already open")]
    GateAlreadySolved,
    #[error("nothing opens this gate")]
    GateUnsolvable,
    #[error("the trap is no longer armed")]
    TrapNotArmed,
    #[error("the campfire has burned out")]
    CampfireConsumed,
    #[error("{0} is not here")]
    ActorNotHere(ActorId),
    #[error("{0} is gone")]
    ActorGone(ActorId),
    #[error("{0} will not talk like that")]
    NotAnEnemy(ActorId),
    #[error("{0} has nothing to say")]
    NotAnNpc(ActorId),
    #[error("{0} is not calm enough to be pacified")]
    PacifyLocked(ActorId),
    #[error("pacifying costs {needed} sanity but you have {available}")]
    InsufficientSanity { needed: i32, available: i32 },
    #[error("nothing hostile will appear in room {0} again")]
    RoomCleared(RoomId),
}
