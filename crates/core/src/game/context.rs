//! Per-action working set: the open transaction plus the loaded run and its config.
//! Owns turn bookkeeping, event logging, stat clamping, and death.

use std::mem;

use super::*;

#[derive(Clone, Copy)]
pub(super) struct Env<'e> {
    pub(super) content: &'e ContentCatalog,
    pub(super) tuning: &'e Tuning,
    pub(super) placeholders: &'e Placeholders,
}

impl<'e> Env<'e> {
    pub(super) fn composer(&self) -> Composer<'e> {
        Composer::new(self.content, &self.tuning.compose, self.placeholders)
    }
}

pub(super) struct ActionContext<'e> {
    pub(super) tx: Transaction<'e>,
    pub(super) env: Env<'e>,
    pub(super) profile: &'e DifficultyProfile,
    pub(super) run: Run,
    pub(super) config: RunConfig,
    report: Report,
}

impl<'e> ActionContext<'e> {
    pub(super) fn open(
        tx: Transaction<'e>,
        env: Env<'e>,
        run_id: RunId,
    ) -> Result<Self, ActionError> {
        let run = tx.run(run_id)?.ok_or(NotFound::Run(run_id))?;
        let config = tx.run_config(run_id)?.ok_or(NotFound::RunConfig(run_id))?;
        let profile = env
            .content
            .difficulty(&run.difficulty)
            .ok_or_else(|| NotFound::Difficulty(run.difficulty.clone()))?;
        let report = Report { turn: run.turn, ..Report::default() };
        Ok(Self { tx, env, profile, run, config, report })
    }

    /// Writes the run and configuration back and hands over the buffered batch.
    pub(super) fn finish(mut self) -> Result<WriteBatch, ActionError> {
        self.tx.put_run(self.run)?;
        self.tx.put_run_config(self.config)?;
        Ok(self.tx.into_batch())
    }

    pub(super) fn run(&self) -> &Run {
        &self.run
    }

    pub(super) fn seed(&self) -> u64 {
        self.run.seed
    }

    pub(super) fn ensure_active(&self) -> Result<(), ActionError> {
        if self.run.is_over() {
            return Err(Precondition::RunOver.into());
        }
        Ok(())
    }

    pub(super) fn begin_turn(&mut self) {
        self.run.turn += 1;
        self.report.turn = self.run.turn;
    }

    /// Shared tail of every turn-consuming action.
    pub(super) fn end_turn(&mut self, entered_room: bool) -> Result<(), ActionError> {
        if self.run.is_over() {
            return Ok(());
        }
        if entered_room {
            self.expand_frontier()?;
        }
        self.apply_atmosphere()?;
        if self.run.is_over() {
            return Ok(());
        }
        self.actor_pulse()?;
        if entered_room {
            self.narrate_room()?;
        }
        Ok(())
    }

    pub(super) fn take_report(&mut self) -> Report {
        let turn = self.run.turn;
        Report { turn, ..mem::take(&mut self.report) }
    }

    pub(super) fn say(&mut self, message: impl Into<String>) {
        self.report.messages.push(message.into());
    }

    pub(super) fn narrate(&mut self, lines: impl IntoIterator<Item = String>) {
        self.report.narration.extend(lines);
    }

    pub(super) fn log(&mut self, kind: EventKind) -> Result<(), ActionError> {
        let id = EventId(self.tx.allocate_id(Table::Event)?);
        self.report.events.push(kind.clone());
        self.tx.append_event(RunEvent { id, run_id: self.run.id, turn: self.run.turn, kind })?;
        Ok(())
    }

    pub(super) fn room(&self, id: RoomId) -> Result<Room, ActionError> {
        Ok(self.tx.room(self.run.id, id)?.ok_or(NotFound::Room(id))?)
    }

    pub(super) fn current_room(&self) -> Result<Room, ActionError> {
        self.room(self.run.current_room)
    }

    pub(super) fn object(&self, id: ObjectId) -> Result<WorldObject, ActionError> {
        Ok(self.tx.object(self.run.id, id)?.ok_or(NotFound::Object(id))?)
    }

    pub(super) fn actor(&self, id: ActorId) -> Result<Actor, ActionError> {
        Ok(self.tx.actor(self.run.id, id)?.ok_or(NotFound::Actor(id))?)
    }

    /// Loads an actor that must be alive and standing in the player's room.
    pub(super) fn present_actor(&self, id: ActorId) -> Result<Actor, ActionError> {
        let actor = self.actor(id)?;
        if !actor.alive {
            return Err(Precondition::ActorGone(id).into());
        }
        if actor.room_id != self.run.current_room {
            return Err(Precondition::ActorNotHere(id).into());
        }
        Ok(actor)
    }

    /// Applies a clamped stat change and ends the run when health runs out.
    pub(super) fn apply_stats(&mut self, delta: StatDelta) -> Result<(), ActionError> {
        if delta.is_zero() {
            return Ok(());
        }
        self.run.stats.apply(delta);
        if self.run.stats.health <= STAT_MIN && !self.run.is_over() {
            self.run.status = RunStatus::Dead;
            self.log(EventKind::PlayerDied)?;
            self.say("Your strength gives out. The dark keeps you.");
            info!(run = %self.run.id, turn = self.run.turn, "player died");
        }
        Ok(())
    }

    pub(super) fn compose_request<'r>(
        &'r self,
        scope_id: u64,
        context_tags: &'r [String],
        room_name: &'r str,
    ) -> ComposeRequest<'r> {
        ComposeRequest {
            seed: self.run.seed,
            turn: self.run.turn,
            scope_id,
            packs: &self.config.content_packs,
            context_tags,
            sanity: self.run.stats.sanity,
            morality: self.run.stats.morality,
            disposition: None,
            max_lines: self.env.tuning.compose.narration_lines,
            phase: None,
            exclude_keys: &[],
            player_name: &self.run.player_name,
            room_name,
        }
    }
}
