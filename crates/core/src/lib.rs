pub mod composer;
pub mod content;
pub mod game;
pub mod journal;
pub mod journal_file;
pub mod mapgen;
pub mod replay;
pub mod rng;
pub mod state;
pub mod store;
pub mod tuning;
pub mod types;

pub use content::ContentCatalog;
pub use game::{ActionError, Engine, NewRun, Report};
pub use journal::{InputJournal, InputPayload, InputRecord};
pub use replay::{ReplayError, ReplayResult, replay_to_end};
pub use store::{JsonFileStore, MemoryStore, Store};
pub use tuning::Tuning;
pub use types::*;
