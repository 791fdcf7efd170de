//! Procedural world generation split into coherent submodules.

pub mod model;
pub mod solvability;

mod generator;
mod layout;
mod placement;
mod room;

pub use generator::WorldGenerator;
pub use model::{GeneratedObject, GeneratedRoom, GeneratedWorld};
pub(crate) use placement::roll_trap;
pub use room::{MAX_DANGER, RoomBlueprint, RoomRequest, build_room, clamp_danger};
pub use solvability::{
    GraphObject, GraphRoom, Solvability, SolvabilityReport, are_all_gates_solvable,
};

use crate::content::ContentCatalog;
use crate::tuning::WorldTuning;

pub fn generate_world(
    seed: u64,
    packs: &[String],
    catalog: &ContentCatalog,
    tuning: &WorldTuning,
) -> GeneratedWorld {
    WorldGenerator::new(catalog, tuning).generate(seed, packs)
}
