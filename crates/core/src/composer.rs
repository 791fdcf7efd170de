//! Procedural text composition over the authored snippet pool.
//!
//! A composition filters the pool by eligibility, draws lines by weight in
//! phase order (or from one pinned phase), and renders placeholders. Every
//! draw is keyed by `(seed, turn, scope)`, so the same request always
//! produces the same text. Running out of eligible content yields an empty
//! composition, never an error.

mod eligibility;
mod select;
mod template;

use thiserror::Error;

use crate::content::{ContentCatalog, FearWord};
use crate::rng::{KeyedRng, Purpose};
use crate::tuning::ComposeTuning;
use crate::types::{Disposition, Phase, STAT_MAX, clamp_stat};

pub use eligibility::{fear_word_eligible, snippet_eligible};
pub use select::weighted_pick;
pub use template::{FEAR_WORD, PLAYER, Placeholders, ROOM};

/// Substituted for `{fearWord}` when no vocabulary entry is eligible.
pub const FEAR_WORD_FALLBACK: &str = "something";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Clone, Debug, Default)]
pub struct ComposeRequest<'a> {
    pub seed: u64,
    pub turn: u64,
    /// Identity the draw is keyed by, e.g. a room or actor id.
    pub scope_id: u64,
    pub packs: &'a [String],
    pub context_tags: &'a [String],
    pub sanity: i32,
    pub morality: i32,
    /// `None` when no actor is involved; entries requiring a disposition are then skipped.
    pub disposition: Option<Disposition>,
    pub max_lines: usize,
    pub phase: Option<Phase>,
    pub exclude_keys: &'a [String],
    pub player_name: &'a str,
    pub room_name: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    pub lines: Vec<String>,
    pub used_keys: Vec<String>,
}

impl Composition {
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Multiplier applied to pack-specific vocabulary; grows linearly as sanity drops.
pub fn fear_bias(sanity: i32, max_multiplier: f64) -> f64 {
    let max_multiplier = if max_multiplier.is_finite() { max_multiplier.max(1.0) } else { 1.0 };
    let sanity = f64::from(clamp_stat(sanity)) / f64::from(STAT_MAX);
    1.0 + (max_multiplier - 1.0) * (1.0 - sanity)
}

pub struct Composer<'a> {
    catalog: &'a ContentCatalog,
    tuning: &'a ComposeTuning,
    placeholders: &'a Placeholders,
}

impl<'a> Composer<'a> {
    pub fn new(
        catalog: &'a ContentCatalog,
        tuning: &'a ComposeTuning,
        placeholders: &'a Placeholders,
    ) -> Self {
        Self { catalog, tuning, placeholders }
    }

    pub fn compose(&self, request: &ComposeRequest<'_>) -> Composition {
        let eligible = self
            .catalog
            .snippets
            .iter()
            .filter(|snippet| snippet_eligible(snippet, request))
            .collect();
        let mut rng =
            KeyedRng::new(request.seed, Purpose::Compose, &[request.turn, request.scope_id]);
        let selection = select::Selection::new(eligible, request.exclude_keys, request.max_lines);
        let picked = match request.phase {
            Some(phase) => selection.pinned(&mut rng, phase),
            None => selection.progressive(&mut rng),
        };

        let mut composition = Composition::default();
        for (line, snippet) in picked.into_iter().enumerate() {
            composition.lines.push(self.render(&snippet.text, request, line as u64));
            composition.used_keys.push(snippet.key.clone());
        }
        composition
    }

    /// Renders one authored line. `line` separates the fear-word draws of
    /// different lines within the same request.
    pub fn render(&self, text: &str, request: &ComposeRequest<'_>, line: u64) -> String {
        let mut occurrence = 0_u64;
        self.placeholders.render(text, |name| match name {
            PLAYER => Some(request.player_name.to_string()),
            ROOM => Some(request.room_name.to_string()),
            FEAR_WORD => {
                let word = self
                    .pick_fear_word(request, line, occurrence)
                    .map_or(FEAR_WORD_FALLBACK, |word| word.word.as_str());
                occurrence += 1;
                Some(word.to_string())
            }
            _ => None,
        })
    }

    pub fn pick_fear_word(
        &self,
        request: &ComposeRequest<'_>,
        line: u64,
        occurrence: u64,
    ) -> Option<&'a FearWord> {
        let words: Vec<&FearWord> = self
            .catalog
            .fear_words
            .iter()
            .filter(|word| fear_word_eligible(word, request))
            .collect();
        let bias = fear_bias(request.sanity, self.tuning.fear_bias_max);
        let weights: Vec<f64> = words
            .iter()
            .map(|word| if word.pack.is_some() { word.weight * bias } else { word.weight })
            .collect();
        let mut rng = KeyedRng::new(
            request.seed,
            Purpose::FearWord,
            &[request.turn, request.scope_id, line, occurrence],
        );
        rng.weighted_index(&weights).and_then(|index| words.get(index).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Snippet, keys};

    struct Fixture {
        catalog: ContentCatalog,
        tuning: ComposeTuning,
        placeholders: Placeholders,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: ContentCatalog::build_default(),
                tuning: ComposeTuning::default(),
                placeholders: Placeholders::compile().expect("pattern compiles"),
            }
        }

        fn composer(&self) -> Composer<'_> {
            Composer::new(&self.catalog, &self.tuning, &self.placeholders)
        }
    }

    fn ambient<'a>(tags: &'a [String], packs: &'a [String]) -> ComposeRequest<'a> {
        ComposeRequest {
            seed: 1234,
            turn: 3,
            scope_id: 7,
            packs,
            context_tags: tags,
            sanity: 80,
            morality: 0,
            disposition: None,
            max_lines: 2,
            phase: None,
            exclude_keys: &[],
            player_name: "Wren",
            room_name: "Ossuary",
        }
    }

    #[test]
    fn identical_requests_compose_identical_text() {
        let fixture = Fixture::new();
        let tags = vec!["ambient".to_string(), "bones".to_string()];
        let request = ambient(&tags, &[]);
        let a = fixture.composer().compose(&request);
        let b = fixture.composer().compose(&request);
        assert_eq!(a, b);
        assert_eq!(a.lines.len(), 2);
        assert!(!a.text().contains('{'), "{}", a.text());
    }

    #[test]
    fn no_eligible_content_is_an_empty_composition() {
        let fixture = Fixture::new();
        let tags = vec!["nothing-matches".to_string()];
        let mut catalog = fixture.catalog.clone();
        catalog.snippets.retain(|snippet| !snippet.tags.is_empty());
        let composer = Composer::new(&catalog, &fixture.tuning, &fixture.placeholders);
        let composition = composer.compose(&ambient(&tags, &[]));
        assert!(composition.is_empty());
        assert_eq!(composition.text(), "");
    }

    #[test]
    fn used_keys_are_distinct_within_one_composition() {
        let fixture = Fixture::new();
        let tags = vec!["ambient".to_string(), "quiet".to_string(), "stone".to_string()];
        let mut request = ambient(&tags, &[]);
        request.max_lines = 10;
        let composition = fixture.composer().compose(&request);
        let mut keys = composition.used_keys.clone();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), composition.used_keys.len());
    }

    #[test]
    fn fear_bias_scales_with_lost_sanity() {
        assert_eq!(fear_bias(100, 4.0), 1.0);
        assert_eq!(fear_bias(0, 4.0), 4.0);
        assert_eq!(fear_bias(50, 3.0), 2.0);
        assert_eq!(fear_bias(-20, 4.0), 4.0);
        assert_eq!(fear_bias(40, 0.5), 1.0);
    }

    #[test]
    fn pack_words_appear_more_often_at_low_sanity() {
        let fixture = Fixture::new();
        let packs = vec![keys::PACK_ABYSS.to_string()];
        let composer = fixture.composer();
        let count_pack_words = |sanity: i32| {
            (0..2_000_u64)
                .filter(|turn| {
                    let request =
                        ComposeRequest { turn: *turn, sanity, ..ambient(&[], &packs) };
                    composer
                        .pick_fear_word(&request, 0, 0)
                        .is_some_and(|word| word.pack.is_some())
                })
                .count()
        };
        let calm = count_pack_words(100);
        let frayed = count_pack_words(0);
        assert!(frayed > calm, "calm={calm} frayed={frayed}");
    }

    #[test]
    fn each_fear_word_occurrence_draws_independently() {
        let mut fixture = Fixture::new();
        fixture.catalog.snippets = vec![Snippet {
            key: "many".to_string(),
            text: "{fearWord} {fearWord} {fearWord} {fearWord} {fearWord} {fearWord}".to_string(),
            phase: Some(Phase::Opening),
            weight: 1.0,
            sanity_min: None,
            sanity_max: None,
            morality_min: None,
            morality_max: None,
            pack: None,
            disposition: None,
            tags: Vec::new(),
        }];
        let differs = (0..20_u64).any(|turn| {
            let request = ComposeRequest { turn, max_lines: 1, ..ambient(&[], &[]) };
            let text = fixture.composer().compose(&request).text();
            let words: Vec<&str> = text.split(' ').collect();
            words.windows(2).any(|pair| pair[0] != pair[1])
        });
        assert!(differs);
    }

    #[test]
    fn player_and_room_are_substituted() {
        let fixture = Fixture::new();
        let request = ambient(&[], &[]);
        let rendered = fixture.composer().render("{player} in the {room}: {unknown}", &request, 0);
        assert_eq!(rendered, "Wren in the Ossuary: {unknown}");
    }
}
