//! `{placeholder}` substitution. Unknown placeholders are left verbatim.

use regex::{Captures, Regex};

const PLACEHOLDER_PATTERN: &str = r"\{(\w+)\}";

pub const PLAYER: &str = "player";
pub const ROOM: &str = "room";
pub const FEAR_WORD: &str = "fearWord";

pub struct Placeholders {
    pattern: Regex,
}

impl Placeholders {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(PLACEHOLDER_PATTERN)? })
    }

    /// Replaces each placeholder with `resolve(name)`, or keeps it when that
    /// yields `None`. `resolve` runs once per occurrence, left to right.
    pub fn render(&self, text: &str, mut resolve: impl FnMut(&str) -> Option<String>) -> String {
        self.pattern
            .replace_all(text, |captures: &Captures<'_>| {
                resolve(&captures[1]).unwrap_or_else(|| captures[0].to_string())
            })
            .into_owned()
    }
}
