//! Room-to-room movement, gate checks, and trap resolution.

use super::*;

impl ActionContext<'_> {
    /// The unsolved gate in `room` blocking `direction`, if any.
    pub(super) fn blocking_gate(
        &self,
        room: &Room,
        direction: Direction,
    ) -> Result<Option<PuzzleGate>, ActionError> {
        let objects = self.tx.objects_in_room(self.run.id, room.id)?;
        Ok(objects.into_iter().find_map(|object| match object.kind {
            ObjectKind::PuzzleGate(gate) if gate.blocked_direction == direction && !gate.solved => {
                Some(gate)
            }
            _ => None,
        }))
    }

    pub(super) fn move_player(&mut self, direction: Direction) -> Result<(), ActionError> {
        let from = self.current_room()?;
        let Some(target) = from.exit(direction) else {
            return Err(Precondition::NoExit(direction).into());
        };
        if let Some(gate) = self.blocking_gate(&from, direction)? {
            return Err(
                Precondition::GateSealed { direction, required_key: gate.required_key }.into()
            );
        }
        let to = self.room(target)?;

        self.begin_turn();
        self.run.current_room = to.id;
        self.log(EventKind::Moved { from: from.id, to: to.id, direction })?;
        self.say(format!("You head {direction} into the {}.", to.name));

        self.resolve_traps(to.id, TrapTiming::OnEnter)?;
        self.end_turn(true)
    }

    /// Fires every armed trap in `room` with the given timing.
    pub(super) fn resolve_traps(
        &mut self,
        room: RoomId,
        timing: TrapTiming,
    ) -> Result<u32, ActionError> {
        let mut fired = 0;
        for mut object in self.tx.objects_in_room(self.run.id, room)? {
            let ObjectKind::Trap(trap) = &mut object.kind else {
                continue;
            };
            if !trap.is_armed() || trap.timing != timing {
                continue;
            }
            trap.state = TrapState::Triggered;
            let penalty = trap.penalty();
            object.hidden = false;
            let id = object.id;
            self.tx.put_object(object)?;
            self.fire_trap(id, penalty)?;
            fired += 1;
        }
        Ok(fired)
    }

    pub(super) fn fire_trap(
        &mut self,
        object: ObjectId,
        penalty: StatDelta,
    ) -> Result<(), ActionError> {
        self.say(format!(
            "A trap springs! You lose {} health and {} sanity.",
            -penalty.health,
            -penalty.sanity
        ));
        self.log(EventKind::TrapTriggered {
            object,
            health: penalty.health,
            sanity: penalty.sanity,
        })?;
        self.apply_stats(penalty)
    }

    pub(super) fn narrate_room(&mut self) -> Result<(), ActionError> {
        let room = self.current_room()?;
        let mut tags = vec!["ambient".to_string()];
        tags.extend(room.tags.iter().cloned());

        let composition = {
            let request = self.compose_request(room.id.0, &tags, &room.name);
            self.env.composer().compose(&request)
        };
        self.narrate(composition.lines);

        let speakers: Vec<Actor> = self
            .tx
            .actors_in_room(self.run.id, room.id)?
            .into_iter()
            .filter(|actor| actor.is_alive_npc() && actor.npc().is_some_and(|npc| npc.auto_speak))
            .collect();
        let npc_tags = vec!["npc".to_string()];
        for speaker in speakers {
            let composition = {
                let mut request = self.compose_request(speaker.id.0, &npc_tags, &room.name);
                request.disposition = Some(speaker.traits.disposition);
                request.max_lines = self.env.tuning.compose.dialogue_lines;
                self.env.composer().compose(&request)
            };
            if !composition.is_empty() {
                self.narrate([format!("{}: {}", speaker.name, composition.text())]);
            }
        }
        Ok(())
    }
}
