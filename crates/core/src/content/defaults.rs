//! Built-in catalog used when no external content is supplied.

use super::*;

pub(super) fn catalog() -> ContentCatalog {
    ContentCatalog {
        items: items(),
        themes: themes(),
        archetypes: archetypes(),
        difficulties: difficulties(),
        snippets: snippets(),
        fear_words: fear_words(),
        dialogue: dialogue(),
    }
}

fn item(key: &str, name: &str, key_item: bool) -> ItemDef {
    ItemDef { key: key.to_string(), name: name.to_string(), key_item }
}

fn items() -> Vec<ItemDef> {
    vec![
        item(keys::KEY_BRASS, "Brass Key", true),
        item(keys::KEY_BONE, "Bone Key", true),
        item(keys::KEY_GLASS, "Glass Key", true),
        item(keys::KEY_IRON, "Iron Key", true),
        item(keys::LANTERN_OIL, "Lantern Oil", false),
        item(keys::BANDAGE, "Bandage", false),
        item(keys::CANDLE_STUB, "Candle Stub", false),
        item(keys::OLD_COIN, "Old Coin", false),
        item(keys::DRIED_HERBS, "Dried Herbs", false),
        item(keys::TORN_PAGE, "Torn Page", false),
        item(keys::SALT_POUCH, "Pouch of Salt", false),
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn theme(key: &str, names: &[&str], tags: &[&str], pack: Option<&str>) -> RoomTheme {
    RoomTheme {
        key: key.to_string(),
        names: strings(names),
        tags: strings(tags),
        pack: pack.map(str::to_string),
        weight: 1.0,
    }
}

fn themes() -> Vec<RoomTheme> {
    vec![
        theme(
            "cellar",
            &["Damp Cellar", "Root Cellar", "Flooded Undercroft"],
            &["damp", "stone"],
            None,
        ),
        theme("ossuary", &["Ossuary", "Bone Gallery", "Charnel Niche"], &["bones", "quiet"], None),
        theme(
            "chapel",
            &["Ruined Chapel", "Hollow Nave", "Candle Shrine"],
            &["holy", "quiet"],
            None,
        ),
        theme(
            "corridor",
            &["Narrow Passage", "Crooked Hall", "Servant Corridor"],
            &["stone", "narrow"],
            None,
        ),
        theme("library", &["Mildewed Library", "Reading Alcove"], &["paper", "quiet"], None),
        theme(
            "rift",
            &["Whispering Rift", "Starless Gallery"],
            &["void", "abyss"],
            Some(keys::PACK_ABYSS),
        ),
        theme(
            "grotto",
            &["Drowned Grotto", "Tidal Vault"],
            &["damp", "drowned"],
            Some(keys::PACK_DROWNED),
        ),
    ]
}

fn archetype(
    key: &str,
    kind: ActorKindTag,
    names: &[&str],
    intensity: (u8, u8),
    pack: Option<&str>,
) -> ActorArchetype {
    ActorArchetype {
        key: key.to_string(),
        kind,
        names: strings(names),
        intensity_min: intensity.0,
        intensity_max: intensity.1,
        pack: pack.map(str::to_string),
    }
}

fn archetypes() -> Vec<ActorArchetype> {
    use ActorKindTag::{Enemy, Npc};
    vec![
        archetype(
            "lost_pilgrim",
            Npc,
            &["Pilgrim Aldous", "Sister Maren", "Old Tobin"],
            (10, 40),
            None,
        ),
        archetype("candle_keeper", Npc, &["Keeper Ysolde", "Keeper Bram"], (20, 50), None),
        archetype("drowned_sailor", Npc, &["Salt-Eyed Finn"], (30, 60), Some(keys::PACK_DROWNED)),
        archetype("gnawer", Enemy, &["Gnawer", "Pale Gnawer"], (15, 45), None),
        archetype("hollow_watcher", Enemy, &["Hollow Watcher"], (40, 75), None),
        archetype("weeping_shade", Enemy, &["Weeping Shade"], (60, 95), None),
        archetype("void_choir", Enemy, &["Voice of the Choir"], (70, 100), Some(keys::PACK_ABYSS)),
    ]
}

fn difficulties() -> Vec<DifficultyProfile> {
    vec![
        DifficultyProfile {
            key: keys::DIFFICULTY_STORY.to_string(),
            name: "Story".to_string(),
            min_npcs_per_room: 1,
            min_enemies_per_room: 0,
            max_npcs_per_room: 2,
            max_enemies_per_room: 1,
            spawn_chance: 0.25,
            move_chance: 0.2,
            npc_spawn_multiplier: 2.0,
            enemy_spawn_multiplier: 0.5,
            enemy_pressure: 0.6,
            sanity_drain_multiplier: 0.5,
            pacify_cost_multiplier: 0.5,
            endless: false,
            ring_radius: 0,
            rooms_per_turn: 0,
            max_rooms: None,
            content_packs: Vec::new(),
        },
        DifficultyProfile {
            key: keys::DIFFICULTY_NORMAL.to_string(),
            name: "Normal".to_string(),
            min_npcs_per_room: 0,
            min_enemies_per_room: 0,
            max_npcs_per_room: 2,
            max_enemies_per_room: 2,
            spawn_chance: 0.3,
            move_chance: 0.35,
            npc_spawn_multiplier: 1.0,
            enemy_spawn_multiplier: 1.0,
            enemy_pressure: 1.0,
            sanity_drain_multiplier: 1.0,
            pacify_cost_multiplier: 1.0,
            endless: false,
            ring_radius: 0,
            rooms_per_turn: 0,
            max_rooms: None,
            content_packs: Vec::new(),
        },
        DifficultyProfile {
            key: keys::DIFFICULTY_HARD.to_string(),
            name: "Hard".to_string(),
            min_npcs_per_room: 0,
            min_enemies_per_room: 1,
            max_npcs_per_room: 1,
            max_enemies_per_room: 3,
            spawn_chance: 0.4,
            move_chance: 0.5,
            npc_spawn_multiplier: 0.6,
            enemy_spawn_multiplier: 1.6,
            enemy_pressure: 1.5,
            sanity_drain_multiplier: 1.5,
            pacify_cost_multiplier: 1.5,
            endless: false,
            ring_radius: 0,
            rooms_per_turn: 0,
            max_rooms: None,
            content_packs: strings(&[keys::PACK_DROWNED]),
        },
        DifficultyProfile {
            key: keys::DIFFICULTY_ENDLESS.to_string(),
            name: "Endless".to_string(),
            min_npcs_per_room: 0,
            min_enemies_per_room: 0,
            max_npcs_per_room: 2,
            max_enemies_per_room: 2,
            spawn_chance: 0.3,
            move_chance: 0.4,
            npc_spawn_multiplier: 1.0,
            enemy_spawn_multiplier: 1.2,
            enemy_pressure: 1.2,
            sanity_drain_multiplier: 1.0,
            pacify_cost_multiplier: 1.0,
            endless: true,
            ring_radius: 2,
            rooms_per_turn: 6,
            max_rooms: Some(400),
            content_packs: strings(&[keys::PACK_ABYSS]),
        },
    ]
}

struct SnippetSpec<'a> {
    key: &'a str,
    text: &'a str,
    phase: Option<Phase>,
    tags: &'a [&'a str],
    weight: f64,
    sanity: (Option<i32>, Option<i32>),
    pack: Option<&'a str>,
    disposition: Option<Disposition>,
}

impl<'a> SnippetSpec<'a> {
    fn new(key: &'a str, phase: Option<Phase>, tags: &'a [&'a str], text: &'a str) -> Self {
        Self {
            key,
            text,
            phase,
            tags,
            weight: 1.0,
            sanity: (None, None),
            pack: None,
            disposition: None,
        }
    }

    fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    fn sanity(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.sanity = (min, max);
        self
    }

    fn pack(mut self, pack: &'a str) -> Self {
        self.pack = Some(pack);
        self
    }

    fn disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = Some(disposition);
        self
    }

    fn build(self) -> Snippet {
        Snippet {
            key: self.key.to_string(),
            text: self.text.to_string(),
            phase: self.phase,
            weight: self.weight,
            sanity_min: self.sanity.0,
            sanity_max: self.sanity.1,
            morality_min: None,
            morality_max: None,
            pack: self.pack.map(str::to_string),
            disposition: self.disposition,
            tags: strings(self.tags),
        }
    }
}

fn snippets() -> Vec<Snippet> {
    use Phase::{Closing, Middle, Opening};
    vec![
        SnippetSpec::new("amb_open_enter", Some(Opening), &["ambient"], "You step into the {room}.")
            .weight(3.0),
        SnippetSpec::new(
            "amb_open_damp",
            Some(Opening),
            &["damp"],
            "Water ticks somewhere in the {room}.",
        ),
        SnippetSpec::new(
            "amb_open_bones",
            Some(Opening),
            &["bones"],
            "Bones are stacked with terrible patience.",
        ),
        SnippetSpec::new(
            "amb_open_holy",
            Some(Opening),
            &["holy"],
            "Wax has pooled and hardened beneath a broken icon.",
        ),
        SnippetSpec::new(
            "amb_mid_quiet",
            Some(Middle),
            &["quiet"],
            "The quiet here has a texture, like {fearWord}.",
        ),
        SnippetSpec::new(
            "amb_mid_stone",
            Some(Middle),
            &["stone", "narrow"],
            "The stone sweats under your palm.",
        ),
        SnippetSpec::new(
            "amb_mid_paper",
            Some(Middle),
            &["paper"],
            "Pages stir though the air is still.",
        ),
        SnippetSpec::new(
            "amb_mid_low",
            Some(Middle),
            &["ambient"],
            "You are certain something said {player}.",
        )
        .sanity(None, Some(40)),
        SnippetSpec::new(
            "amb_mid_void",
            Some(Middle),
            &["ambient", "void"],
            "Beyond the edge of the lamp there is only {fearWord}.",
        )
        .pack(keys::PACK_ABYSS),
        SnippetSpec::new(
            "amb_mid_drowned",
            Some(Middle),
            &["ambient", "drowned"],
            "Your boots fill with {fearWord}.",
        )
        .pack(keys::PACK_DROWNED),
        SnippetSpec::new(
            "amb_close_steady",
            Some(Closing),
            &["ambient"],
            "You steady your breathing.",
        )
        .sanity(Some(50), None),
        SnippetSpec::new(
            "amb_close_shaking",
            Some(Closing),
            &["ambient"],
            "Your hands will not stop shaking.",
        )
        .sanity(None, Some(49)),
        SnippetSpec::new(
            "amb_any_drip",
            None,
            &["ambient"],
            "Something drips, slow as a heartbeat.",
        ),
        SnippetSpec::new(
            "npc_open_greet",
            Some(Opening),
            &["npc"],
            "\"Another one,\" they whisper. \"Welcome, {player}.\"",
        ),
        SnippetSpec::new(
            "npc_open_wary",
            Some(Opening),
            &["npc"],
            "They keep the lantern between you and them.",
        )
        .disposition(Disposition::Unknown),
        SnippetSpec::new(
            "npc_mid_friendly",
            Some(Middle),
            &["npc"],
            "\"Stay near the fires. The {room} is kinder there.\"",
        )
        .disposition(Disposition::Friendly),
        SnippetSpec::new(
            "npc_mid_rumor",
            Some(Middle),
            &["npc"],
            "\"Deeper down, they say the walls are made of {fearWord}.\"",
        ),
        SnippetSpec::new("npc_mid_hostile", Some(Middle), &["npc"], "\"Keep walking,\" they spit.")
            .disposition(Disposition::Hostile),
        SnippetSpec::new("npc_close_farewell", Some(Closing), &["npc"], "\"Go carefully.\""),
        SnippetSpec::new(
            "npc_close_dread",
            Some(Closing),
            &["npc"],
            "\"It already knows your name, {player}.\"",
        )
        .sanity(None, Some(35)),
        SnippetSpec::new(
            "enemy_open_growl",
            Some(Opening),
            &["enemy"],
            "It turns toward your voice.",
        )
        .disposition(Disposition::Hostile),
        SnippetSpec::new(
            "enemy_mid_listen",
            Some(Middle),
            &["enemy"],
            "Its breathing slows as you speak.",
        ),
        SnippetSpec::new(
            "enemy_mid_calm",
            Some(Middle),
            &["enemy"],
            "It lowers itself, almost gently.",
        )
        .disposition(Disposition::Friendly),
        SnippetSpec::new(
            "enemy_close_fear",
            Some(Closing),
            &["enemy"],
            "Its eyes hold {fearWord}.",
        ),
        SnippetSpec::new(
            "enemy_mid_choir",
            Some(Middle),
            &["enemy"],
            "A hundred voices answer yours from {fearWord}.",
        )
        .pack(keys::PACK_ABYSS),
    ]
    .into_iter()
    .map(SnippetSpec::build)
    .collect()
}

fn fear_word(
    key: &str,
    word: &str,
    weight: f64,
    sanity: (Option<i32>, Option<i32>),
    pack: Option<&str>,
) -> FearWord {
    FearWord {
        key: key.to_string(),
        word: word.to_string(),
        weight,
        sanity_min: sanity.0,
        sanity_max: sanity.1,
        pack: pack.map(str::to_string),
    }
}

fn fear_words() -> Vec<FearWord> {
    vec![
        fear_word("fw_dread", "dread", 2.0, (None, None), None),
        fear_word("fw_dark", "the dark", 2.0, (None, None), None),
        fear_word("fw_whispers", "whispers", 1.5, (None, None), None),
        fear_word("fw_rot", "rot", 1.0, (None, None), None),
        fear_word("fw_teeth", "the teeth", 1.0, (None, Some(40)), None),
        fear_word("fw_it", "it", 0.5, (None, Some(25)), None),
        fear_word("fw_void", "the void", 1.0, (None, None), Some(keys::PACK_ABYSS)),
        fear_word("fw_hunger", "starless hunger", 0.5, (None, Some(60)), Some(keys::PACK_ABYSS)),
        fear_word("fw_black_water", "black water", 1.0, (None, None), Some(keys::PACK_DROWNED)),
        fear_word("fw_tide", "the tide", 0.5, (None, None), Some(keys::PACK_DROWNED)),
    ]
}

fn choice(
    key: &str,
    text: &str,
    next: Option<&str>,
    morality_delta: i32,
    sanity_delta: i32,
    disposition: Option<Disposition>,
) -> DialogueChoice {
    DialogueChoice {
        key: key.to_string(),
        text: text.to_string(),
        next: next.map(str::to_string),
        morality_delta,
        sanity_delta,
        disposition,
    }
}

fn node(key: &str, root: bool, text: &str, choices: Vec<DialogueChoice>) -> DialogueNode {
    DialogueNode { key: key.to_string(), text: text.to_string(), root, tags: Vec::new(), choices }
}

fn dialogue() -> Vec<DialogueNode> {
    use Disposition::{Friendly, Hostile};
    vec![
        node(
            "pilgrim_greeting",
            true,
            "A hunched figure lifts a lantern toward you.",
            vec![
                choice("ask_way", "Ask the way deeper.", Some("pilgrim_directions"), 0, 0, None),
                choice(
                    "offer_help",
                    "Offer to share your light.",
                    Some("pilgrim_thanks"),
                    10,
                    0,
                    Some(Friendly),
                ),
                choice("threaten", "Demand their lantern.", None, -15, -2, Some(Hostile)),
                choice("leave", "Walk away.", None, 0, 0, None),
            ],
        ),
        node(
            "pilgrim_directions",
            false,
            "\"The deeper rooms remember you,\" they murmur.",
            vec![
                choice("thank", "Thank them.", None, 2, 0, None),
                choice("press", "Ask what they mean.", Some("pilgrim_secret"), 0, -3, None),
            ],
        ),
        node(
            "pilgrim_thanks",
            false,
            "They press your hand. It is warmer than it should be.",
            vec![choice("leave", "Move on.", None, 0, 5, None)],
        ),
        node(
            "pilgrim_secret",
            false,
            "\"There are gates that answer only to keys. Find the key before the gate finds you.\"",
            vec![choice("leave", "Move on.", None, 0, 0, None)],
        ),
        node(
            "keeper_greeting",
            true,
            "A candle-keeper trims a wick and gestures at the bench.",
            vec![
                choice("sit", "Sit a while.", Some("keeper_rest"), 0, 4, Some(Friendly)),
                choice("leave", "Decline and leave.", None, 0, 0, None),
            ],
        ),
        node(
            "keeper_rest",
            false,
            "The flame does not flicker, even when the dark leans close.",
            vec![choice("leave", "Rise and go.", None, 1, 2, None)],
        ),
    ]
}
