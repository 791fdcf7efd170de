//! Predicates deciding which authored entries a request may draw from.

use crate::content::{FearWord, Snippet};

use super::ComposeRequest;

fn in_range(value: i32, min: Option<i32>, max: Option<i32>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

pub(super) fn pack_enabled(pack: Option<&String>, packs: &[String]) -> bool {
    pack.is_none_or(|pack| packs.contains(pack))
}

pub fn snippet_eligible(snippet: &Snippet, request: &ComposeRequest<'_>) -> bool {
    if !pack_enabled(snippet.pack.as_ref(), request.packs) {
        return false;
    }
    if !in_range(request.sanity, snippet.sanity_min, snippet.sanity_max) {
        return false;
    }
    if !in_range(request.morality, snippet.morality_min, snippet.morality_max) {
        return false;
    }
    if let Some(required) = snippet.disposition
        && request.disposition != Some(required)
    {
        return false;
    }
    snippet.tags.is_empty()
        || snippet.tags.iter().any(|tag| request.context_tags.contains(tag))
}

pub fn fear_word_eligible(word: &FearWord, request: &ComposeRequest<'_>) -> bool {
    pack_enabled(word.pack.as_ref(), request.packs)
        && in_range(request.sanity, word.sanity_min, word.sanity_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Disposition, Phase};

    fn snippet() -> Snippet {
        Snippet {
            key: "probe".to_string(),
            text: "probe".to_string(),
            phase: Some(Phase::Middle),
            weight: 1.0,
            sanity_min: None,
            sanity_max: None,
            morality_min: None,
            morality_max: None,
            pack: None,
            disposition: None,
            tags: Vec::new(),
        }
    }

    fn request<'a>(packs: &'a [String], tags: &'a [String]) -> ComposeRequest<'a> {
        ComposeRequest { packs, context_tags: tags, sanity: 50, morality: 0, ..Default::default() }
    }

    #[test]
    fn untagged_unconstrained_entry_is_always_eligible() {
        assert!(snippet_eligible(&snippet(), &request(&[], &[])));
    }

    #[test]
    fn tags_need_one_intersection() {
        let entry = Snippet { tags: vec!["damp".into(), "stone".into()], ..snippet() };
        assert!(!snippet_eligible(&entry, &request(&[], &["quiet".into()])));
        assert!(snippet_eligible(&entry, &request(&[], &["quiet".into(), "stone".into()])));
    }

    #[test]
    fn ranges_are_inclusive() {
        let entry = Snippet { sanity_min: Some(50), sanity_max: Some(50), ..snippet() };
        assert!(snippet_eligible(&entry, &request(&[], &[])));
        let entry = Snippet { morality_max: Some(-1), ..snippet() };
        assert!(!snippet_eligible(&entry, &request(&[], &[])));
    }

    #[test]
    fn pack_and_disposition_requirements() {
        let entry = Snippet { pack: Some("abyss".into()), ..snippet() };
        assert!(!snippet_eligible(&entry, &request(&[], &[])));
        assert!(snippet_eligible(&entry, &request(&["abyss".into()], &[])));

        let entry = Snippet { disposition: Some(Disposition::Friendly), ..snippet() };
        let mut req = request(&[], &[]);
        assert!(!snippet_eligible(&entry, &req));
        req.disposition = Some(Disposition::Hostile);
        assert!(!snippet_eligible(&entry, &req));
        req.disposition = Some(Disposition::Friendly);
        assert!(snippet_eligible(&entry, &req));
    }
}
