//! Actor lifecycle: minimum top-up, the spawn pulse, and the enemy move pulse.

use super::*;

/// Live head-count of one room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Census {
    npcs: u32,
    enemies: u32,
}

impl Census {
    fn of(actors: &[Actor]) -> Self {
        let mut census = Self::default();
        for actor in actors {
            if actor.is_alive_npc() {
                census.npcs += 1;
            } else if actor.is_alive_enemy() {
                census.enemies += 1;
            }
        }
        census
    }
}

impl ActionContext<'_> {
    fn census(&self, room: RoomId) -> Result<Census, ActionError> {
        Ok(Census::of(&self.tx.actors_in_room(self.run.id, room)?))
    }

    pub(super) fn actor_pulse(&mut self) -> Result<(), ActionError> {
        self.top_up_current_room()?;
        self.spawn_pulse()?;
        self.move_pulse()
    }

    /// Spawns until the player's room meets the difficulty minimums.
    pub(super) fn top_up_current_room(&mut self) -> Result<(), ActionError> {
        let room = self.current_room()?;
        let census = self.census(room.id)?;
        for _ in census.npcs..self.profile.min_npcs_per_room {
            self.spawn_in(room.id, ActorKindTag::Npc)?;
        }
        if !room.is_cleared {
            for _ in census.enemies..self.profile.min_enemies_per_room {
                self.spawn_in(room.id, ActorKindTag::Enemy)?;
            }
        }
        Ok(())
    }

    fn spawn_pulse(&mut self) -> Result<(), ActionError> {
        let room = self.current_room()?;
        let mut rng = KeyedRng::new(self.seed(), Purpose::SpawnPulse, &[self.run.turn, room.id.0]);
        if !rng.chance(self.profile.spawn_chance) {
            return Ok(());
        }
        let census = self.census(room.id)?;
        let npc_open = census.npcs < self.profile.max_npcs_per_room;
        let enemy_open = !room.is_cleared && census.enemies < self.profile.max_enemies_per_room;
        let weights = [
            if npc_open { self.profile.npc_spawn_multiplier } else { 0.0 },
            if enemy_open { self.profile.enemy_spawn_multiplier } else { 0.0 },
        ];
        let kind = match rng.weighted_index(&weights) {
            Some(0) => ActorKindTag::Npc,
            Some(_) => ActorKindTag::Enemy,
            // Both multipliers zero: fall back to whichever kind still has room.
            None if npc_open => ActorKindTag::Npc,
            None if enemy_open => ActorKindTag::Enemy,
            None => return Ok(()),
        };
        self.spawn_in(room.id, kind)?;
        Ok(())
    }

    fn move_pulse(&mut self) -> Result<(), ActionError> {
        let seed = self.seed();
        let turn = self.run.turn;
        let mut gate = KeyedRng::new(seed, Purpose::MovePulse, &[turn]);
        if !gate.chance(self.profile.move_chance) {
            return Ok(());
        }

        let player_room = self.run.current_room;
        let follow_bias = self.env.tuning.actors.follow_bias;
        let mut enemies: Vec<Actor> = self
            .tx
            .actors(self.run.id)?
            .into_iter()
            .filter(Actor::is_alive_enemy)
            .collect();
        enemies.sort_by_key(|actor| actor.id);

        for mut enemy in enemies {
            let from = self.room(enemy.room_id)?;
            let mut rng = KeyedRng::new(seed, Purpose::MovePulse, &[turn, enemy.id.0]);
            let Some(to) = choose_step(&mut rng, &from, player_room, follow_bias) else {
                continue;
            };
            enemy.room_id = to;
            let actor = enemy.id;
            let name = enemy.name.clone();
            self.tx.put_actor(enemy)?;
            if to == player_room {
                self.log(EventKind::ActorEnteredPlayerRoom { actor, from: from.id })?;
                self.say(format!("{name} slips into the room."));
            } else if from.id == player_room {
                self.log(EventKind::ActorLeftPlayerRoom { actor, to })?;
                self.say(format!("{name} drifts away."));
            }
        }
        Ok(())
    }

    /// Debug spawn in the player's room that ignores caps.
    pub(super) fn spawn_requested(&mut self, kind: ActorKindTag) -> Result<Actor, ActionError> {
        let room = self.current_room()?;
        if kind == ActorKindTag::Enemy && room.is_cleared {
            return Err(Precondition::RoomCleared(room.id).into());
        }
        self.spawn_in(room.id, kind)
    }

    pub(super) fn spawn_in(
        &mut self,
        room: RoomId,
        kind: ActorKindTag,
    ) -> Result<Actor, ActionError> {
        let id = ActorId(self.tx.allocate_id(Table::Actor)?);
        let mut rng = KeyedRng::new(self.seed(), Purpose::ActorTraits, &[id.0]);
        let content = self.env.content;
        let packs = &self.config.content_packs;
        let archetypes: Vec<&ActorArchetype> = content
            .archetypes_of(kind)
            .into_iter()
            .filter(|archetype| archetype.pack.as_ref().is_none_or(|pack| packs.contains(pack)))
            .collect();

        let (archetype, name, intensity) = match rng.pick(&archetypes) {
            Some(archetype) => {
                let name =
                    rng.pick(&archetype.names).cloned().unwrap_or_else(|| archetype.key.clone());
                let intensity = rng.range_u32(
                    u32::from(archetype.intensity_min),
                    u32::from(archetype.intensity_max.min(100)),
                ) as u8;
                (archetype.key.clone(), name, intensity)
            }
            None => {
                let (key, name) = match kind {
                    ActorKindTag::Npc => ("stranger", "Stranger"),
                    ActorKindTag::Enemy => ("shade", "Shade"),
                };
                (key.to_string(), name.to_string(), rng.range_u32(10, 60) as u8)
            }
        };

        let actor = match kind {
            ActorKindTag::Npc => Actor {
                id,
                run_id: self.run.id,
                room_id: room,
                archetype,
                name,
                traits: ActorTraits {
                    intensity,
                    morality: rng.range_i32(-50, 50),
                    disposition: Disposition::Unknown,
                },
                alive: true,
                kind: ActorKind::Npc(NpcState {
                    sanity: rng.range_i32(20, STAT_MAX),
                    auto_speak: rng.chance(self.env.tuning.actors.npc_auto_speak_chance),
                }),
            },
            ActorKindTag::Enemy => Actor {
                id,
                run_id: self.run.id,
                room_id: room,
                archetype,
                name,
                traits: ActorTraits {
                    intensity,
                    morality: rng.range_i32(MORALITY_MIN, 0),
                    disposition: Disposition::Hostile,
                },
                alive: true,
                kind: ActorKind::Enemy(EnemyState {
                    hostile: true,
                    speech_level: speech_level(intensity),
                    pacify_progress: 0,
                    pacify_unlocked: false,
                    pacified: false,
                }),
            },
        };
        self.tx.put_actor(actor.clone())?;
        self.log(EventKind::ActorSpawned { actor: id, kind, room })?;
        if room == self.run.current_room {
            self.say(format!("{} is here.", actor.name));
        }
        Ok(actor)
    }
}

/// Where a moving enemy goes next, or `None` when it has nowhere to go.
fn choose_step(
    rng: &mut KeyedRng,
    from: &Room,
    player_room: RoomId,
    follow_bias: f64,
) -> Option<RoomId> {
    let exits: Vec<RoomId> = from.exits.values().copied().collect();
    if exits.is_empty() {
        return None;
    }
    if from.id != player_room && exits.contains(&player_room) && rng.chance(follow_bias) {
        return Some(player_room);
    }
    rng.pick(&exits).copied()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn room_with_exits(id: u64, exits: &[(Direction, u64)]) -> Room {
        Room {
            id: RoomId(id),
            run_id: RunId(1),
            coord: Coord::ORIGIN,
            depth: 0,
            danger: 0,
            name: "Hall".to_string(),
            theme: "hall".to_string(),
            tags: Vec::new(),
            exits: exits.iter().map(|(direction, to)| (*direction, RoomId(*to))).collect(),
            has_been_searched: false,
            is_cleared: false,
            frontier_added: 0,
            frontier_grown: false,
        }
    }

    #[test]
    fn enemies_without_exits_stay_put() {
        let mut rng = KeyedRng::new(1, Purpose::MovePulse, &[0]);
        assert_eq!(choose_step(&mut rng, &room_with_exits(2, &[]), RoomId(1), 1.0), None);
    }

    #[test]
    fn full_follow_bias_always_follows_a_direct_exit() {
        let room = room_with_exits(2, &[(Direction::North, 5), (Direction::West, 1)]);
        for turn in 0..100 {
            let mut rng = KeyedRng::new(1, Purpose::MovePulse, &[turn, 2]);
            assert_eq!(choose_step(&mut rng, &room, RoomId(1), 1.0), Some(RoomId(1)));
        }
    }

    #[test]
    fn follow_bias_is_roughly_half_by_default() {
        let room = room_with_exits(2, &[(Direction::North, 5), (Direction::West, 1)]);
        let follows = (0..2_000_u64)
            .filter(|turn| {
                let mut rng = KeyedRng::new(1, Purpose::MovePulse, &[*turn, 2]);
                choose_step(&mut rng, &room, RoomId(1), 0.5) == Some(RoomId(1))
            })
            .count();
        // Follow roll plus half of the uniform fallback.
        assert!((1_300..1_700).contains(&follows), "follows={follows}");
    }

    #[test]
    fn top_up_meets_minimums_on_creation() {
        let mut engine = engine();
        set_profile(&mut engine, "hard", |profile| {
            profile.min_npcs_per_room = 1;
            profile.min_enemies_per_room = 2;
            profile.max_enemies_per_room = 3;
        });
        let run = engine
            .create_run(NewRun {
                seed: Some(77),
                difficulty: "hard".to_string(),
                player_name: "Wren".to_string(),
            })
            .expect("create");
        let actors = engine.actors_here(run.id).expect("actors");
        assert!(actors.iter().filter(|actor| actor.is_alive_npc()).count() >= 1);
        assert!(actors.iter().filter(|actor| actor.is_alive_enemy()).count() >= 2);
    }

    #[test]
    fn spawn_pulse_respects_caps() {
        let mut engine = engine();
        set_profile(&mut engine, "normal", |profile| {
            profile.spawn_chance = 1.0;
            profile.move_chance = 0.0;
            profile.max_npcs_per_room = 1;
            profile.max_enemies_per_room = 1;
        });
        let run = engine
            .create_run(NewRun {
                seed: Some(5),
                difficulty: "normal".to_string(),
                player_name: "Wren".to_string(),
            })
            .expect("create");
        for _ in 0..10 {
            engine.advance_turn(run.id, TurnReason::Wait).expect("wait");
        }
        let actors = engine.actors_here(run.id).expect("actors");
        assert_eq!(actors.iter().filter(|actor| actor.is_alive_npc()).count(), 1);
        assert_eq!(actors.iter().filter(|actor| actor.is_alive_enemy()).count(), 1);
    }

    #[test]
    fn debug_spawn_refuses_enemies_in_cleared_rooms() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let mut room = engine.current_room(run.id).expect("room");
        room.is_cleared = true;
        engine.store.put_room(room.clone()).expect("put room");

        let err = engine.spawn_actor(run.id, ActorKindTag::Enemy).expect_err("cleared");
        assert!(matches!(
            err,
            ActionError::Precondition(Precondition::RoomCleared(id)) if id == room.id
        ));
        let npc = engine.spawn_actor(run.id, ActorKindTag::Npc).expect("npcs are fine");
        assert_eq!(npc.room_id, room.id);
        assert_eq!(npc.traits.disposition, Disposition::Unknown);
    }

    #[test]
    fn spawned_enemy_is_hostile_with_a_speech_tier() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let enemy = engine.spawn_actor(run.id, ActorKindTag::Enemy).expect("spawn");
        let state = enemy.enemy().expect("enemy state");
        assert!(state.hostile);
        assert_eq!(state.speech_level, speech_level(enemy.traits.intensity));
        assert_eq!(enemy.traits.disposition, Disposition::Hostile);
    }
}
