//! Branching NPC conversations with composed flavor lines.

use serde::Serialize;

use super::*;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub key: String,
    pub text: String,
}

/// What an NPC says right now and how the player may answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DialogueView {
    pub actor: ActorId,
    pub node_key: String,
    pub text: String,
    pub phase: Phase,
    pub choices: Vec<ChoiceView>,
}

impl ActionContext<'_> {
    fn present_npc(&self, id: ActorId) -> Result<Actor, ActionError> {
        let actor = self.actor(id)?;
        if actor.npc().is_none() {
            return Err(Precondition::NotAnNpc(id).into());
        }
        self.present_actor(id)
    }

    fn open_conversation(&mut self, actor: &Actor) -> Result<ConversationState, ActionError> {
        if let Some(state) = self.tx.conversation(self.run.id, actor.id)? {
            return Ok(state);
        }
        let roots = self.env.content.dialogue_roots();
        let mut rng = KeyedRng::new(self.seed(), Purpose::DialogueRoot, &[actor.id.0]);
        let root = rng.pick(&roots).ok_or(NotFound::DialogueRoot)?;
        Ok(ConversationState {
            run_id: self.run.id,
            actor_id: actor.id,
            node_key: root.key.clone(),
            phase: Phase::Opening,
            last_content_keys: Vec::new(),
        })
    }

    pub(super) fn get_dialogue(&mut self, id: ActorId) -> Result<DialogueView, ActionError> {
        let content = self.env.content;
        let actor = self.present_npc(id)?;
        let mut state = self.open_conversation(&actor)?;
        let node = content
            .dialogue_node(&state.node_key)
            .ok_or_else(|| NotFound::DialogueNode(state.node_key.clone()))?;
        let room = self.current_room()?;

        let mut tags = vec!["npc".to_string()];
        tags.extend(node.tags.iter().cloned());
        let (text, composition) = {
            let mut request = self.compose_request(id.0, &tags, &room.name);
            request.disposition = Some(actor.traits.disposition);
            request.phase = Some(state.phase);
            request.max_lines = self.env.tuning.compose.dialogue_lines;
            request.exclude_keys = &state.last_content_keys;
            let composer = self.env.composer();
            (composer.render(&node.text, &request, u64::MAX), composer.compose(&request))
        };

        let view_phase = state.phase;
        let mut text = text;
        if !composition.is_empty() {
            text = format!("{text} {}", composition.text());
            state.last_content_keys = composition.used_keys;
            state.phase = state.phase.advance();
        }
        let view = DialogueView {
            actor: id,
            node_key: node.key.clone(),
            text,
            phase: view_phase,
            choices: node
                .choices
                .iter()
                .map(|choice| ChoiceView { key: choice.key.clone(), text: choice.text.clone() })
                .collect(),
        };
        self.tx.put_conversation(state)?;
        Ok(view)
    }

    pub(super) fn choose_dialogue(
        &mut self,
        id: ActorId,
        choice_key: &str,
    ) -> Result<(), ActionError> {
        let content = self.env.content;
        let mut actor = self.present_npc(id)?;
        let mut state =
            self.tx.conversation(self.run.id, id)?.ok_or(NotFound::Conversation(id))?;
        let node = content
            .dialogue_node(&state.node_key)
            .ok_or_else(|| NotFound::DialogueNode(state.node_key.clone()))?;
        let choice = node
            .choices
            .iter()
            .find(|choice| choice.key == choice_key)
            .ok_or_else(|| NotFound::Choice(choice_key.to_string()))?;
        let next = match &choice.next {
            Some(next) => Some(
                content.dialogue_node(next).ok_or_else(|| NotFound::DialogueNode(next.clone()))?,
            ),
            None => None,
        };

        self.apply_stats(StatDelta {
            health: 0,
            sanity: choice.sanity_delta,
            morality: choice.morality_delta,
        })?;
        if let Some(disposition) = choice.disposition {
            actor.traits.disposition = disposition;
            self.tx.put_actor(actor)?;
        }
        self.log(EventKind::DialogueChosen {
            actor: id,
            node: node.key.clone(),
            choice: choice.key.clone(),
        })?;
        self.say(choice.text.clone());

        match next {
            Some(next) => {
                state.node_key = next.key.clone();
                self.tx.put_conversation(state)?;
            }
            None => self.tx.remove_conversation(self.run.id, id)?,
        }
        Ok(())
    }
}
