//! Talking enemies down. Progress only grows, and unlocking is one-way.

use super::*;

pub const PACIFY_COMPLETE: u8 = 100;

/// Speech tier for an intensity: simple, guarded, or eloquent.
pub fn speech_level(intensity: u8) -> u8 {
    match intensity {
        0..34 => 0,
        34..67 => 1,
        _ => 2,
    }
}

/// Progress gained by one talk action; never less than one point.
pub fn pacify_gain(tier_gain: &[u32; 3], speech_level: u8, intensity: u8) -> u8 {
    let base = tier_gain[usize::from(speech_level.min(2))];
    let intensity = u32::from(intensity.min(100));
    let scaled = base * (200 - intensity) / 200;
    scaled.clamp(1, u32::from(PACIFY_COMPLETE)) as u8
}

/// Sanity spent to pacify an unlocked enemy.
pub fn pacify_cost(base: f64, multiplier: f64, intensity: u8) -> i32 {
    let cost = base * multiplier * (1.0 + f64::from(intensity) / 100.0);
    if cost.is_finite() { cost.ceil().max(0.0) as i32 } else { 0 }
}

impl ActionContext<'_> {
    fn present_enemy(&self, id: ActorId) -> Result<Actor, ActionError> {
        let actor = self.actor(id)?;
        if actor.enemy().is_none() {
            return Err(Precondition::NotAnEnemy(id).into());
        }
        self.present_actor(id)
    }

    pub(super) fn talk_to_enemy(&mut self, id: ActorId) -> Result<(), ActionError> {
        let mut actor = self.present_enemy(id)?;
        let intensity = actor.traits.intensity;
        let tier_gain = self.env.tuning.actors.pacify_tier_gain;

        let Some(enemy) = actor.enemy_mut() else {
            return Err(Precondition::NotAnEnemy(id).into());
        };
        let gain = pacify_gain(&tier_gain, enemy.speech_level, intensity);
        enemy.pacify_progress = enemy.pacify_progress.saturating_add(gain).min(PACIFY_COMPLETE);
        let progress = enemy.pacify_progress;
        let unlocked_now = progress >= PACIFY_COMPLETE && !enemy.pacify_unlocked;
        if unlocked_now {
            enemy.pacify_unlocked = true;
            enemy.hostile = false;
        }

        self.log(EventKind::TalkedToEnemy { actor: id, progress })?;
        if unlocked_now {
            actor.traits.disposition = Disposition::Friendly;
            self.log(EventKind::PacifyUnlocked { actor: id })?;
            info!(run = %self.run.id, actor = %id, "pacify unlocked");
        }

        let room = self.current_room()?;
        let tags = vec!["enemy".to_string()];
        let composition = {
            let mut request = self.compose_request(
                mix_seed_stream(id.0, u64::from(progress)),
                &tags,
                &room.name,
            );
            request.phase = Some(talk_phase(progress));
            request.disposition = Some(actor.traits.disposition);
            request.max_lines = self.env.tuning.compose.dialogue_lines;
            self.env.composer().compose(&request)
        };
        if composition.is_empty() {
            self.say(format!("{} only stares.", actor.name));
        } else {
            self.narrate([format!("{}: {}", actor.name, composition.text())]);
        }
        if unlocked_now {
            self.say(format!("{} lowers its guard.", actor.name));
        }
        self.tx.put_actor(actor)?;
        Ok(())
    }

    pub(super) fn try_pacify(&mut self, id: ActorId) -> Result<(), ActionError> {
        let mut actor = self.present_enemy(id)?;
        let unlocked = actor.enemy().is_some_and(|enemy| enemy.pacify_unlocked);
        if !unlocked {
            return Err(Precondition::PacifyLocked(id).into());
        }
        let cost = pacify_cost(
            self.env.tuning.actors.pacify_base_cost,
            self.profile.pacify_cost_multiplier,
            actor.traits.intensity,
        );
        let available = self.run.stats.sanity;
        if available < cost {
            return Err(Precondition::InsufficientSanity { needed: cost, available }.into());
        }

        self.apply_stats(StatDelta::sanity(-cost))?;
        actor.alive = false;
        if let Some(enemy) = actor.enemy_mut() {
            enemy.pacified = true;
        }
        let mut room = self.room(actor.room_id)?;
        room.is_cleared = true;
        let room_id = room.id;
        let name = actor.name.clone();
        self.tx.put_room(room)?;
        self.tx.put_actor(actor)?;
        self.log(EventKind::Pacified { actor: id, room: room_id, sanity_cost: cost })?;
        self.say(format!("{name} fades into stillness. This room is quiet now."));
        info!(run = %self.run.id, actor = %id, room = %room_id, cost, "enemy pacified");
        Ok(())
    }
}

fn talk_phase(progress: u8) -> Phase {
    match progress {
        0..34 => Phase::Opening,
        34..PACIFY_COMPLETE => Phase::Middle,
        _ => Phase::Closing,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn speech_tiers_split_intensity_in_thirds() {
        assert_eq!(speech_level(0), 0);
        assert_eq!(speech_level(33), 0);
        assert_eq!(speech_level(34), 1);
        assert_eq!(speech_level(66), 1);
        assert_eq!(speech_level(67), 2);
        assert_eq!(speech_level(255), 2);
    }

    #[test]
    fn gain_shrinks_with_intensity() {
        let tiers = [30, 20, 12];
        assert_eq!(pacify_gain(&tiers, 0, 0), 30);
        assert_eq!(pacify_gain(&tiers, 0, 20), 27);
        assert_eq!(pacify_gain(&tiers, 2, 100), 6);
        assert_eq!(pacify_gain(&[0, 0, 0], 1, 50), 1);
    }

    #[test]
    fn cost_scales_with_intensity_and_difficulty() {
        assert_eq!(pacify_cost(10.0, 1.0, 0), 10);
        assert_eq!(pacify_cost(10.0, 1.0, 50), 15);
        assert_eq!(pacify_cost(10.0, 1.5, 50), 23);
        assert_eq!(pacify_cost(10.0, f64::NAN, 50), 0);
    }

    proptest! {
        #[test]
        fn gain_is_always_positive_and_bounded(level in 0_u8..4, intensity in any::<u8>()) {
            let gain = pacify_gain(&[30, 20, 12], level, intensity);
            prop_assert!(gain >= 1);
            prop_assert!(gain <= PACIFY_COMPLETE);
        }
    }

    #[test]
    fn talking_unlocks_then_pacify_clears_the_room() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = engine.current_room(run.id).expect("room");
        let enemy = insert_enemy(&mut engine, run.id, room.id, 20);

        let err = engine.try_pacify(run.id, enemy).expect_err("still locked");
        assert!(matches!(err, ActionError::Precondition(Precondition::PacifyLocked(_))));

        let mut talks = 0;
        loop {
            let report = engine.talk_to_enemy(run.id, enemy).expect("talk");
            talks += 1;
            if report.events.contains(&EventKind::PacifyUnlocked { actor: enemy }) {
                break;
            }
            assert!(talks < 100, "progress must reach the cap");
        }
        assert_eq!(engine.run(run.id).expect("run").turn, 0, "talking is free");

        let actor = engine.store().actor(run.id, enemy).expect("read").expect("actor");
        let state = actor.enemy().expect("enemy");
        assert_eq!(state.pacify_progress, PACIFY_COMPLETE);
        assert!(state.pacify_unlocked);
        assert!(!state.hostile);
        assert_eq!(actor.traits.disposition, Disposition::Friendly);

        let sanity_before = engine.run(run.id).expect("run").stats.sanity;
        let report = engine.try_pacify(run.id, enemy).expect("pacify");
        let cost = pacify_cost(10.0, 1.0, 20);
        assert!(report.events.contains(&EventKind::Pacified {
            actor: enemy,
            room: room.id,
            sanity_cost: cost,
        }));
        assert_eq!(engine.run(run.id).expect("run").stats.sanity, sanity_before - cost);

        let actor = engine.store().actor(run.id, enemy).expect("read").expect("actor");
        assert!(!actor.alive);
        assert!(actor.enemy().is_some_and(|state| state.pacified));
        assert!(engine.current_room(run.id).expect("room").is_cleared);

        let err = engine.talk_to_enemy(run.id, enemy).expect_err("gone");
        assert!(matches!(err, ActionError::Precondition(Precondition::ActorGone(_))));
    }

    #[test]
    fn pacify_without_enough_sanity_changes_nothing() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = engine.current_room(run.id).expect("room");
        let enemy = insert_enemy(&mut engine, run.id, room.id, 90);
        for _ in 0..40 {
            engine.talk_to_enemy(run.id, enemy).expect("talk");
        }
        set_stats(&mut engine, run.id, PlayerStats { health: 100, sanity: 3, morality: 0 });
        let before = engine.store().clone();

        let err = engine.try_pacify(run.id, enemy).expect_err("too costly");
        assert!(matches!(
            err,
            ActionError::Precondition(Precondition::InsufficientSanity { available: 3, .. })
        ));
        assert_eq!(engine.store(), &before);
    }

    #[test]
    fn only_enemies_can_be_talked_down() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = engine.current_room(run.id).expect("room");
        let npc = insert_npc(&mut engine, run.id, room.id, Disposition::Unknown);
        let err = engine.talk_to_enemy(run.id, npc).expect_err("not an enemy");
        assert!(matches!(err, ActionError::Precondition(Precondition::NotAnEnemy(_))));
    }
}
