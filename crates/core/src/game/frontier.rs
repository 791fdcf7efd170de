//! Lazy ring expansion for endless runs.
//!
//! After each room entry the graph is grown breadth-first around the player
//! up to the configured radius. Every new room is keyed by the world-gen
//! cursor and its coordinates. Each room receives a number of new exits
//! keyed by its coordinates alone and is grown once, so the same seed and the
//! same moves always grow the same graph regardless of when a room is reached.

use super::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrontierOutcome {
    pub generated: u32,
    pub connected: u32,
    pub cursor: u64,
}

impl FrontierOutcome {
    pub fn changed(&self) -> bool {
        self.generated > 0 || self.connected > 0
    }
}

impl ActionContext<'_> {
    pub(super) fn expand_frontier(&mut self) -> Result<FrontierOutcome, ActionError> {
        let mut outcome =
            FrontierOutcome { cursor: self.config.world_gen_cursor, ..FrontierOutcome::default() };
        if !self.config.endless || self.config.ring_radius == 0 {
            return Ok(outcome);
        }

        let radius = self.config.ring_radius;
        let origin = self.run.current_room;
        let mut visited = BTreeSet::from([origin]);
        let mut queue = VecDeque::from([(origin, 0_u32)]);
        while let Some((id, distance)) = queue.pop_front() {
            if distance >= radius {
                continue;
            }
            self.grow_room(id, distance, &mut outcome)?;
            for next in self.room(id)?.exits.into_values() {
                if visited.insert(next) {
                    queue.push_back((next, distance + 1));
                }
            }
        }

        outcome.cursor = self.config.world_gen_cursor;
        if outcome.changed() {
            self.log(EventKind::FrontierExpanded {
                generated: outcome.generated,
                connected: outcome.connected,
                cursor: outcome.cursor,
            })?;
            debug!(
                run = %self.run.id,
                generated = outcome.generated,
                connected = outcome.connected,
                cursor = outcome.cursor,
                "frontier expanded"
            );
        }
        Ok(outcome)
    }

    fn room_cap_reached(&self) -> Result<bool, ActionError> {
        let Some(cap) = self.config.max_rooms else {
            return Ok(false);
        };
        Ok(self.tx.room_count(self.run.id)? >= cap as usize)
    }

    /// Adds up to the room's coordinate-keyed number of new exits. A room cut
    /// short by the budget or the cap resumes on a later pass.
    fn grow_room(
        &mut self,
        id: RoomId,
        distance: u32,
        outcome: &mut FrontierOutcome,
    ) -> Result<(), ActionError> {
        let mut room = self.room(id)?;
        if room.frontier_grown {
            return Ok(());
        }
        let tuning = &self.env.tuning.frontier;
        let scope = coord_scope(room.coord);
        let mut rng = KeyedRng::new(self.seed(), Purpose::FrontierExits, &scope);
        let target = rng.range_u32(tuning.min_exits, tuning.max_exits);
        let mut directions = Direction::ALL;
        rng.shuffle(&mut directions);

        let mut deferred = false;
        for direction in directions {
            if room.frontier_added >= target {
                break;
            }
            if room.exits.contains_key(&direction) {
                continue;
            }
            let coord = room.coord.step(direction);
            if let Some(mut neighbor) = self.tx.room_at(self.run.id, coord)? {
                if neighbor.exits.contains_key(&direction.opposite()) {
                    continue;
                }
                neighbor.exits.insert(direction.opposite(), room.id);
                room.exits.insert(direction, neighbor.id);
                room.frontier_added += 1;
                self.tx.put_room(neighbor)?;
                self.tx.put_room(room.clone())?;
                outcome.connected += 1;
                continue;
            }
            if outcome.generated >= self.config.rooms_per_turn || self.room_cap_reached()? {
                deferred = true;
                continue;
            }

            let cursor = self.config.world_gen_cursor;
            let child = self.generate_room(&room, direction, distance + 1)?;
            room.exits.insert(direction, child);
            room.frontier_added += 1;
            self.tx.put_room(room.clone())?;
            outcome.generated += 1;
            self.place_gate(room.id, direction, cursor)?;
        }

        if !deferred {
            room.frontier_grown = true;
            self.tx.put_room(room)?;
        }
        Ok(())
    }

    fn generate_room(
        &mut self,
        parent: &Room,
        direction: Direction,
        distance: u32,
    ) -> Result<RoomId, ActionError> {
        let cursor = self.config.world_gen_cursor;
        let coord = parent.coord.step(direction);
        let [x, y] = coord_scope(coord);
        let depth = parent.depth + 1;
        let baseline =
            (f64::from(distance) + f64::from(depth) / 4.0) * self.profile.enemy_pressure;
        let blueprint = build_room(
            &RoomRequest {
                seed: self.seed(),
                purpose: Purpose::FrontierRoom,
                scope: &[cursor, x, y],
                coord,
                depth,
                danger_baseline: baseline,
                packs: &self.config.content_packs,
            },
            self.env.content,
            &self.env.tuning.world,
        );

        let id = RoomId(self.tx.allocate_id(Table::Room)?);
        self.tx.put_room(Room {
            id,
            run_id: self.run.id,
            coord,
            depth,
            danger: blueprint.danger,
            name: blueprint.name,
            theme: blueprint.theme,
            tags: blueprint.tags,
            exits: BTreeMap::from([(direction.opposite(), parent.id)]),
            has_been_searched: false,
            is_cleared: false,
            frontier_added: 0,
            frontier_grown: false,
        })?;
        self.config.world_gen_cursor += 1;
        self.furnish_room(id, blueprint.danger, cursor)?;
        Ok(id)
    }

    fn furnish_room(&mut self, room: RoomId, danger: u8, cursor: u64) -> Result<(), ActionError> {
        let frontier = &self.env.tuning.frontier;
        let world = &self.env.tuning.world;
        let mut rng = KeyedRng::new(self.seed(), Purpose::FrontierObjects, &[cursor]);
        let mut placed = Vec::new();

        if rng.chance(frontier.item_chance)
            && let Some(item) = rng.pick(&self.env.content.loot_pool())
        {
            let hidden = rng.chance(world.hidden_item_chance);
            let kind = ObjectKind::GroundItem(GroundItem {
                item_key: item.key.clone(),
                quantity: 1,
                taken: false,
            });
            placed.push((hidden, kind));
        }
        if rng.chance(frontier.campfire_chance) {
            placed.push((false, ObjectKind::Campfire(Campfire::default())));
        }
        if danger >= world.trap_min_danger && rng.chance(frontier.trap_chance) {
            placed.push((false, ObjectKind::Trap(roll_trap(&mut rng, world))));
        }

        for (hidden, kind) in placed {
            let id = ObjectId(self.tx.allocate_id(Table::Object)?);
            let run_id = self.run.id;
            self.tx.put_object(WorldObject { id, run_id, room_id: room, hidden, kind })?;
        }
        Ok(())
    }

    /// Gates `direction` out of `room` when the validator proves the whole
    /// stored graph stays solvable from the player's position.
    fn place_gate(
        &mut self,
        room: RoomId,
        direction: Direction,
        cursor: u64,
    ) -> Result<bool, ActionError> {
        let mut rng = KeyedRng::new(self.seed(), Purpose::FrontierGate, &[cursor]);
        if !rng.chance(self.env.tuning.frontier.gate_chance) {
            return Ok(false);
        }
        let keys = self.env.content.key_item_pool();
        let Some(key) = rng.pick(&keys).map(|item| item.key.clone()) else {
            return Ok(false);
        };

        let mut gate = WorldObject {
            id: ObjectId::default(),
            run_id: self.run.id,
            room_id: room,
            hidden: false,
            kind: ObjectKind::PuzzleGate(PuzzleGate {
                blocked_direction: direction,
                required_key: Some(key.clone()),
                solved: false,
            }),
        };
        let rooms = self.tx.rooms(self.run.id)?;
        let mut objects = self.tx.objects(self.run.id)?;
        objects.push(gate.clone());
        let carried = self
            .run
            .inventory
            .iter()
            .filter(|(_, quantity)| **quantity > 0)
            .map(|(key, _)| key.clone());
        let report = Solvability::for_stored(&rooms, &objects)
            .with_inventory(carried)
            .check(self.run.current_room.0);
        if !report.solvable {
            debug!(run = %self.run.id, room = %room, key = %key, "frontier gate dropped");
            return Ok(false);
        }

        gate.id = ObjectId(self.tx.allocate_id(Table::Object)?);
        self.tx.put_object(gate)?;
        Ok(true)
    }
}
