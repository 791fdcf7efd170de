//! High-level world generation orchestration that composes layout, placement, and gate validation.

use tracing::debug;

use crate::content::ContentCatalog;
use crate::tuning::WorldTuning;

use super::layout::{LayoutContext, build_layout};
use super::model::GeneratedWorld;
use super::placement::{PlacementContext, place_gate, place_objects};

pub struct WorldGenerator<'a> {
    catalog: &'a ContentCatalog,
    tuning: &'a WorldTuning,
}

impl<'a> WorldGenerator<'a> {
    pub fn new(catalog: &'a ContentCatalog, tuning: &'a WorldTuning) -> Self {
        Self { catalog, tuning }
    }

    pub fn generate(&self, seed: u64, packs: &[String]) -> GeneratedWorld {
        let mut world = build_layout(&LayoutContext {
            seed,
            packs,
            catalog: self.catalog,
            tuning: self.tuning,
        });

        let placement = PlacementContext { seed, catalog: self.catalog, tuning: self.tuning };
        place_objects(&placement, &mut world);
        place_gate(&placement, &mut world);

        debug!(
            seed,
            rooms = world.rooms.len(),
            chain = world.chain_len,
            objects = world.objects.len(),
            gates = world.gate_count(),
            "world generated"
        );
        world
    }
}
