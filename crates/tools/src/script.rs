//! Line-oriented play scripts. One command per line; `#` starts a comment.
//!
//! ```text
//! move north
//! search
//! interact 3
//! wait
//! talk 2
//! pacify 2
//! dialogue 4
//! choose 4 ask_way
//! spawn enemy
//! external bell tolls
//! ```

use anyhow::{Context, Result, anyhow, bail};
use hollow_core::journal::InputPayload;
use hollow_core::types::{ActorId, ActorKindTag, Direction, ObjectId, TurnReason};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub payload: InputPayload,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>> {
    let mut commands = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let payload = parse_command(line).with_context(|| format!("script line {}", index + 1))?;
        commands.push(ScriptLine { line: index + 1, payload });
    }
    Ok(commands)
}

pub fn parse_command(line: &str) -> Result<InputPayload> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or_else(|| anyhow!("empty command"))?.to_ascii_lowercase();
    let mut arg = |name: &str| words.next().ok_or_else(|| anyhow!("`{verb}` needs a {name}"));

    let payload = match verb.as_str() {
        "move" | "go" => InputPayload::Move {
            direction: arg("direction")?.parse::<Direction>().map_err(|e| anyhow!(e))?,
        },
        "search" => InputPayload::Search,
        "interact" | "use" => {
            InputPayload::Interact { object: ObjectId(number(arg("object id")?)?) }
        }
        "wait" => InputPayload::AdvanceTurn { reason: TurnReason::Wait },
        "rest" => InputPayload::AdvanceTurn { reason: TurnReason::Rest },
        "external" => {
            let reason: Vec<&str> = words.by_ref().collect();
            if reason.is_empty() {
                bail!("`external` needs a reason");
            }
            InputPayload::AdvanceTurn { reason: TurnReason::External(reason.join(" ")) }
        }
        "talk" => InputPayload::TalkToEnemy { actor: ActorId(number(arg("actor id")?)?) },
        "pacify" => InputPayload::TryPacify { actor: ActorId(number(arg("actor id")?)?) },
        "dialogue" => InputPayload::GetDialogue { actor: ActorId(number(arg("actor id")?)?) },
        "choose" => {
            let actor = ActorId(number(arg("actor id")?)?);
            let choice = arg("choice key")?.to_string();
            InputPayload::ChooseDialogue { actor, choice }
        }
        "spawn" => InputPayload::SpawnActor {
            kind: arg("actor kind")?.parse::<ActorKindTag>().map_err(|e| anyhow!(e))?,
        },
        other => bail!("unknown command `{other}`"),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected `{extra}` after `{verb}`");
    }
    Ok(payload)
}

/// Writes a payload back in script form; `parse_command` reads it back unchanged.
pub fn format_command(payload: &InputPayload) -> String {
    match payload {
        InputPayload::Move { direction } => format!("move {direction}"),
        InputPayload::Search => "search".to_string(),
        InputPayload::Interact { object } => format!("interact {object}"),
        InputPayload::AdvanceTurn { reason: TurnReason::Wait } => "wait".to_string(),
        InputPayload::AdvanceTurn { reason: TurnReason::Rest } => "rest".to_string(),
        InputPayload::AdvanceTurn { reason: TurnReason::External(reason) } => {
            format!("external {reason}")
        }
        InputPayload::SpawnActor { kind: ActorKindTag::Npc } => "spawn npc".to_string(),
        InputPayload::SpawnActor { kind: ActorKindTag::Enemy } => "spawn enemy".to_string(),
        InputPayload::GetDialogue { actor } => format!("dialogue {actor}"),
        InputPayload::ChooseDialogue { actor, choice } => format!("choose {actor} {choice}"),
        InputPayload::TalkToEnemy { actor } => format!("talk {actor}"),
        InputPayload::TryPacify { actor } => format!("pacify {actor}"),
    }
}

fn number(raw: &str) -> Result<u64> {
    raw.parse::<u64>().with_context(|| format!("`{raw}` is not an id"))
}
