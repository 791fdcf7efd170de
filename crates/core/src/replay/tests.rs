use super::*;
use crate::journal::InputPayload;
use crate::state::ActorKind;
use crate::types::{ActorId, ActorKindTag, Direction, RunId, TurnReason};

const SCRIPT_STEPS: usize = 60;

struct Session {
    engine: Engine<MemoryStore>,
    run: RunId,
    journal: InputJournal,
}

impl Session {
    fn start(seed: u64, difficulty: &str) -> Self {
        let content = ContentCatalog::build_default();
        let mut engine =
            Engine::new(MemoryStore::new(), content.clone(), Tuning::default()).unwrap();
        let run = engine
            .create_run(NewRun {
                seed: Some(seed),
                difficulty: difficulty.to_string(),
                player_name: "Wren".to_string(),
            })
            .unwrap();
        let journal =
            InputJournal::new(seed, difficulty, "Wren").with_content_hash(content.content_hash());
        Self { engine, run: run.id, journal }
    }

    /// Applies `payload` and journals it only if the engine accepted it.
    fn try_input(&mut self, payload: InputPayload) -> bool {
        let turn = self.engine.run(self.run).unwrap().turn;
        match payload.apply(&mut self.engine, self.run) {
            Ok(()) => {
                self.journal.append(turn, payload);
                true
            }
            Err(err) => {
                assert!(err.is_rejection(), "unexpected engine failure: {err}");
                false
            }
        }
    }

    /// A fixed, state-driven script touching every kind of action.
    fn play_script(&mut self, steps: usize) {
        for step in 0..steps {
            let objects = self.engine.visible_objects(self.run).unwrap();
            for object in objects {
                self.try_input(InputPayload::Interact { object: object.id });
            }
            for actor in self.engine.actors_here(self.run).unwrap() {
                match actor.kind {
                    ActorKind::Enemy(_) => {
                        self.try_input(InputPayload::TalkToEnemy { actor: actor.id });
                        self.try_input(InputPayload::TryPacify { actor: actor.id });
                    }
                    ActorKind::Npc(_) => {
                        self.try_input(InputPayload::GetDialogue { actor: actor.id });
                    }
                }
            }
            self.try_input(InputPayload::Search);
            let direction = Direction::ALL[step % Direction::ALL.len()];
            if !self.try_input(InputPayload::Move { direction }) {
                self.try_input(InputPayload::AdvanceTurn { reason: TurnReason::Wait });
            }
        }
    }

    fn result(&self) -> ReplayResult {
        let config = self.engine.run_config(self.run).unwrap();
        ReplayResult {
            final_snapshot_hash: self.engine.snapshot_hash(self.run).unwrap(),
            final_turn: self.engine.run(self.run).unwrap().turn,
            room_count: self.engine.store().room_count(self.run).unwrap(),
            world_gen_cursor: config.world_gen_cursor,
        }
    }
}

fn replay(journal: &InputJournal) -> Result<ReplayResult, ReplayError> {
    replay_to_end(&ContentCatalog::build_default(), &Tuning::default(), journal)
}

#[test]
fn bounded_session_replays_to_the_same_state() {
    let mut session = Session::start(1234, "normal");
    session.play_script(SCRIPT_STEPS);
    assert!(!session.journal.inputs.is_empty());

    assert_eq!(replay(&session.journal).unwrap(), session.result());
}

#[test]
fn endless_session_replays_frontier_growth() {
    let mut session = Session::start(9001, "endless");
    session.play_script(SCRIPT_STEPS);

    let replayed = replay(&session.journal).unwrap();
    assert_eq!(replayed, session.result());
    assert!(replayed.world_gen_cursor > 0, "endless runs grow past the initial world");
}

#[test]
fn spawned_actors_replay_with_the_same_ids() {
    let mut session = Session::start(77, "normal");
    assert!(session.try_input(InputPayload::SpawnActor { kind: ActorKindTag::Npc }));
    session.play_script(8);

    assert_eq!(replay(&session.journal).unwrap(), session.result());
}

#[test]
fn empty_journal_matches_a_fresh_run() {
    let session = Session::start(5, "story");
    let replayed = replay(&session.journal).unwrap();
    assert_eq!(replayed, session.result());
    assert_eq!(replayed.final_turn, 0);
}

#[test]
fn shifted_turns_are_reported_as_divergence() {
    let mut session = Session::start(1234, "normal");
    assert!(session.try_input(InputPayload::AdvanceTurn { reason: TurnReason::Wait }));
    assert!(session.try_input(InputPayload::AdvanceTurn { reason: TurnReason::Wait }));
    session.journal.inputs[1].turn = 7;

    let err = replay(&session.journal).unwrap_err();
    assert!(matches!(err, ReplayError::Diverged { seq: 1, recorded: 7, reached: 1 }));
}

#[test]
fn inputs_the_engine_refuses_fail_the_replay() {
    let mut session = Session::start(1234, "normal");
    session.journal.append(0, InputPayload::TryPacify { actor: ActorId(999) });

    let err = replay(&session.journal).unwrap_err();
    assert!(matches!(err, ReplayError::Rejected { seq: 0, .. }));
}

#[test]
fn journals_from_other_content_are_refused() {
    let mut session = Session::start(1234, "normal");
    session.journal.content_hash ^= 1;
    assert!(matches!(replay(&session.journal), Err(ReplayError::ContentMismatch { .. })));
}
