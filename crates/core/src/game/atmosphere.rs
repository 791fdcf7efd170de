//! Per-turn sanity pressure from the room the player stands in.

use super::*;

impl ActionContext<'_> {
    pub(super) fn apply_atmosphere(&mut self) -> Result<(), ActionError> {
        let room = self.current_room()?;
        let actors = self.tx.actors_in_room(self.run.id, room.id)?;
        let delta = atmosphere_delta(
            self.seed(),
            self.run.turn,
            &room,
            &actors,
            &self.env.tuning.atmosphere,
            self.profile.sanity_drain_multiplier,
        );
        if delta < 0 {
            self.say("The dark presses in on you.");
        }
        self.apply_stats(StatDelta::sanity(delta))
    }
}

/// Net sanity change for one turn spent in `room`.
pub(super) fn atmosphere_delta(
    seed: u64,
    turn: u64,
    room: &Room,
    actors: &[Actor],
    tuning: &AtmosphereTuning,
    drain_multiplier: f64,
) -> i32 {
    let mut rng = KeyedRng::new(seed, Purpose::Atmosphere, &[turn, room.id.0]);
    let mut delta = 0;

    let danger = f64::from(room.danger) / f64::from(MAX_DANGER);
    if rng.chance(danger * tuning.drain_chance) {
        let rolled = rng.range_i32(tuning.drain_amount.min, tuning.drain_amount.max);
        let scaled = (f64::from(rolled) * drain_multiplier.max(0.0)).round() as i32;
        delta -= scaled.max(1);
    }

    for actor in actors {
        if actor.is_alive_enemy() && actor.enemy().is_some_and(|enemy| enemy.hostile) {
            delta -= tuning.enemy_presence_drain;
        }
    }
    let comforted = actors
        .iter()
        .any(|actor| actor.is_alive_npc() && actor.traits.disposition == Disposition::Friendly);
    if comforted {
        delta += tuning.friendly_npc_comfort;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn quiet_room(danger: u8) -> Room {
        Room {
            id: RoomId(9),
            run_id: RunId(1),
            coord: Coord::ORIGIN,
            depth: 0,
            danger,
            name: "Cell".to_string(),
            theme: "cell".to_string(),
            tags: Vec::new(),
            exits: BTreeMap::new(),
            has_been_searched: false,
            is_cleared: false,
            frontier_added: 0,
            frontier_grown: false,
        }
    }

    #[test]
    fn safe_empty_room_never_drains() {
        let tuning = AtmosphereTuning::default();
        for turn in 0..200 {
            assert_eq!(atmosphere_delta(7, turn, &quiet_room(0), &[], &tuning, 1.0), 0);
        }
    }

    #[test]
    fn dangerous_rooms_drain_at_least_one_point() {
        let tuning = AtmosphereTuning { drain_chance: 1.0, ..AtmosphereTuning::default() };
        for turn in 0..50 {
            let delta = atmosphere_delta(7, turn, &quiet_room(MAX_DANGER), &[], &tuning, 0.1);
            assert_eq!(delta, -1);
        }
    }

    #[test]
    fn hostile_company_drains_and_friends_comfort() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        clear_actors(&mut engine, run.id);
        let room = engine.current_room(run.id).expect("room");
        assert_eq!(room.danger, 0);
        let tuning = AtmosphereTuning::default();

        insert_enemy(&mut engine, run.id, room.id, 50);
        let actors = engine.store().actors_in_room(run.id, room.id).expect("actors");
        let alive: Vec<Actor> = actors.into_iter().filter(|actor| actor.alive).collect();
        let delta = atmosphere_delta(1, 1, &room, &alive, &tuning, 1.0);
        assert_eq!(delta, -tuning.enemy_presence_drain);

        insert_npc(&mut engine, run.id, room.id, Disposition::Friendly);
        let actors = engine.store().actors_in_room(run.id, room.id).expect("actors");
        let alive: Vec<Actor> = actors.into_iter().filter(|actor| actor.alive).collect();
        assert_eq!(
            atmosphere_delta(1, 1, &room, &alive, &tuning, 1.0),
            tuning.friendly_npc_comfort - tuning.enemy_presence_drain
        );
    }
}
