//! Room construction primitive shared by initial generation and frontier expansion.

use crate::content::{ContentCatalog, RoomTheme};
use crate::rng::{KeyedRng, Purpose};
use crate::tuning::WorldTuning;
use crate::types::Coord;

pub const MAX_DANGER: u8 = 5;

const FALLBACK_THEME: &str = "hollow";
const FALLBACK_NAME: &str = "Hollow Chamber";

/// Everything a room build is keyed and parameterized by.
pub struct RoomRequest<'a> {
    pub seed: u64,
    pub purpose: Purpose,
    pub scope: &'a [u64],
    pub coord: Coord,
    pub depth: u32,
    pub danger_baseline: f64,
    pub packs: &'a [String],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomBlueprint {
    pub coord: Coord,
    pub depth: u32,
    pub danger: u8,
    pub name: String,
    pub theme: String,
    pub tags: Vec<String>,
}

pub fn clamp_danger(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_DANGER)) as u8
}

fn theme_enabled(theme: &RoomTheme, packs: &[String]) -> bool {
    theme.pack.as_ref().is_none_or(|pack| packs.contains(pack))
}

pub fn build_room(
    request: &RoomRequest<'_>,
    catalog: &ContentCatalog,
    tuning: &WorldTuning,
) -> RoomBlueprint {
    let mut rng = KeyedRng::new(request.seed, request.purpose, request.scope);

    let themes: Vec<&RoomTheme> =
        catalog.themes.iter().filter(|theme| theme_enabled(theme, request.packs)).collect();
    let weights: Vec<f64> = themes
        .iter()
        .map(|theme| match theme.pack {
            Some(_) => theme.weight * tuning.pack_theme_boost.max(1.0),
            None => theme.weight,
        })
        .collect();
    let theme = rng.weighted_index(&weights).and_then(|index| themes.get(index).copied());

    let jitter = rng.range_i32(0, 1);
    let danger = clamp_danger(request.danger_baseline.floor() + f64::from(jitter));

    let Some(theme) = theme else {
        return RoomBlueprint {
            coord: request.coord,
            depth: request.depth,
            danger,
            name: FALLBACK_NAME.to_string(),
            theme: FALLBACK_THEME.to_string(),
            tags: Vec::new(),
        };
    };

    let name = rng.pick(&theme.names).cloned().unwrap_or_else(|| theme.key.clone());
    let mut tags = theme.tags.clone();
    if let Some(pack) = &theme.pack
        && !tags.contains(pack)
    {
        tags.push(pack.clone());
    }
    if danger >= 3 {
        tags.push("dread".to_string());
    }

    RoomBlueprint {
        coord: request.coord,
        depth: request.depth,
        danger,
        name,
        theme: theme.key.clone(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;
    use crate::rng::coord_scope;

    fn request<'a>(scope: &'a [u64], packs: &'a [String], baseline: f64) -> RoomRequest<'a> {
        RoomRequest {
            seed: 77,
            purpose: Purpose::RoomBuild,
            scope,
            coord: Coord::new(3, -2),
            depth: 4,
            danger_baseline: baseline,
            packs,
        }
    }

    #[test]
    fn same_key_builds_the_same_room() {
        let catalog = ContentCatalog::build_default();
        let tuning = WorldTuning::default();
        let scope = coord_scope(Coord::new(3, -2));
        let a = build_room(&request(&scope, &[], 1.0), &catalog, &tuning);
        let b = build_room(&request(&scope, &[], 1.0), &catalog, &tuning);
        assert_eq!(a, b);
    }

    #[test]
    fn danger_stays_in_range_for_extreme_baselines() {
        let catalog = ContentCatalog::build_default();
        let tuning = WorldTuning::default();
        for (index, baseline) in [-40.0, 0.0, 2.5, 99.0, f64::NAN].into_iter().enumerate() {
            let scope = [index as u64];
            let room = build_room(&request(&scope, &[], baseline), &catalog, &tuning);
            assert!(room.danger <= MAX_DANGER);
        }
    }

    #[test]
    fn pack_themes_only_appear_when_enabled() {
        let catalog = ContentCatalog::build_default();
        let tuning = WorldTuning::default();
        let pack_themes: Vec<&str> = catalog
            .themes
            .iter()
            .filter(|theme| theme.pack.is_some())
            .map(|theme| theme.key.as_str())
            .collect();

        for index in 0..200_u64 {
            let scope = [index];
            let room = build_room(&request(&scope, &[], 1.0), &catalog, &tuning);
            assert!(!pack_themes.contains(&room.theme.as_str()));
        }

        let packs = vec![keys::PACK_ABYSS.to_string()];
        let saw_pack_room = (0..200_u64).any(|index| {
            let scope = [index];
            let room = build_room(&request(&scope, &packs, 1.0), &catalog, &tuning);
            room.tags.iter().any(|tag| tag == keys::PACK_ABYSS)
        });
        assert!(saw_pack_room, "enabled pack should bias some rooms toward its theme");
    }

    #[test]
    fn empty_theme_catalog_falls_back_to_a_plain_room() {
        let mut catalog = ContentCatalog::build_default();
        catalog.themes.clear();
        let scope = [1];
        let room = build_room(&request(&scope, &[], 0.0), &catalog, &WorldTuning::default());
        assert_eq!(room.theme, FALLBACK_THEME);
        assert!(room.tags.is_empty());
    }
}
