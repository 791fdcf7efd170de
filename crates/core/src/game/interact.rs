//! Object interactions. Every branch consumes a turn once the target is validated.

use super::*;

impl ActionContext<'_> {
    pub(super) fn interact(&mut self, id: ObjectId) -> Result<(), ActionError> {
        let mut object = self.object(id)?;
        if object.room_id != self.run.current_room {
            return Err(Precondition::ObjectNotHere(id).into());
        }
        if object.hidden {
            return Err(Precondition::ObjectHidden(id).into());
        }

        self.begin_turn();
        match &mut object.kind {
            ObjectKind::GroundItem(item) => {
                if item.taken {
                    return Err(Precondition::ItemAlreadyTaken.into());
                }
                item.taken = true;
                let (key, quantity) = (item.item_key.clone(), item.quantity);
                self.take_item(id, &key, quantity)?;
            }
            ObjectKind::Chest(chest) => {
                if chest.opened {
                    return Err(Precondition::ChestAlreadyOpened.into());
                }
                if let Some(key) = &chest.required_key
                    && !self.run.has_item(key)
                {
                    return Err(Precondition::MissingKey(key.clone()).into());
                }
                chest.opened = true;
                let loot = chest.loot.clone();
                self.log(EventKind::ChestOpened { object: id })?;
                self.say("The chest creaks open.");
                for entry in loot {
                    self.take_item(id, &entry.item_key, entry.quantity)?;
                }
            }
            ObjectKind::Trap(trap) => {
                if !trap.is_armed() {
                    return Err(Precondition::TrapNotArmed.into());
                }
                if trap.timing == TrapTiming::OnInteract {
                    trap.state = TrapState::Triggered;
                    let penalty = trap.penalty();
                    self.fire_trap(id, penalty)?;
                } else {
                    trap.state = TrapState::Disarmed;
                    self.log(EventKind::TrapDisarmed { object: id })?;
                    self.say("You carefully disarm the trap.");
                }
            }
            ObjectKind::PuzzleGate(gate) => {
                if gate.solved {
                    return Err(Precondition::GateAlreadySolved.into());
                }
                let Some(key) = &gate.required_key else {
                    return Err(Precondition::GateUnsolvable.into());
                };
                if !self.run.has_item(key) {
                    return Err(Precondition::MissingKey(key.clone()).into());
                }
                gate.solved = true;
                let name = self.env.content.item_name(key).to_string();
                self.log(EventKind::GateSolved { object: id })?;
                self.say(format!("The {name} turns. The way {} opens.", gate.blocked_direction));
            }
            ObjectKind::Campfire(campfire) => {
                if campfire.consumed {
                    return Err(Precondition::CampfireConsumed.into());
                }
                campfire.consumed = true;
                let rest = &self.env.tuning.atmosphere;
                let delta = StatDelta {
                    health: rest.campfire_health,
                    sanity: rest.campfire_sanity,
                    morality: 0,
                };
                self.apply_stats(delta)?;
                self.log(EventKind::CampfireRested { object: id })?;
                self.say("You rest by the fire. The dark loosens its grip.");
            }
        }
        self.tx.put_object(object)?;
        self.end_turn(false)
    }

    fn take_item(&mut self, object: ObjectId, key: &str, quantity: u32) -> Result<(), ActionError> {
        self.run.add_item(key, quantity);
        let name = self.env.content.item_name(key).to_string();
        self.say(format!("You take {quantity} x {name}."));
        self.log(EventKind::ItemTaken { object, item_key: key.to_string(), quantity })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::MemoryStore;

    fn here(engine: &Engine<MemoryStore>, run: RunId) -> RoomId {
        engine.current_room(run).expect("room").id
    }

    #[test]
    fn ground_items_are_taken_once() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = here(&engine, run.id);
        let coin = insert_object(
            &mut engine,
            run.id,
            room,
            ObjectKind::GroundItem(GroundItem {
                item_key: "old_coin".to_string(),
                quantity: 2,
                taken: false,
            }),
        );
        let before = engine.run(run.id).expect("run").inventory.get("old_coin").copied();
        engine.interact(run.id, coin).expect("take");
        let after = engine.run(run.id).expect("run");
        assert_eq!(after.inventory["old_coin"], before.unwrap_or(0) + 2);
        assert_eq!(after.turn, 1);

        let err = engine.interact(run.id, coin).expect_err("already taken");
        assert!(matches!(err, ActionError::Precondition(Precondition::ItemAlreadyTaken)));
        assert_eq!(engine.run(run.id).expect("run").turn, 1, "rejections do not consume a turn");
    }

    #[test]
    fn locked_chest_needs_its_key() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = here(&engine, run.id);
        let chest = insert_object(
            &mut engine,
            run.id,
            room,
            ObjectKind::Chest(Chest {
                loot: vec![LootEntry { item_key: "bandage".to_string(), quantity: 1 }],
                required_key: Some("key_test".to_string()),
                opened: false,
            }),
        );

        let err = engine.interact(run.id, chest).expect_err("locked");
        assert!(matches!(
            err,
            ActionError::Precondition(Precondition::MissingKey(ref key)) if key == "key_test"
        ));

        give_item(&mut engine, run.id, "key_test");
        let report = engine.interact(run.id, chest).expect("open");
        assert!(report.events.contains(&EventKind::ChestOpened { object: chest }));
        assert!(engine.run(run.id).expect("run").has_item("bandage"));
    }

    #[test]
    fn keyless_gate_is_unsolvable() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = here(&engine, run.id);
        let gate = insert_object(
            &mut engine,
            run.id,
            room,
            ObjectKind::PuzzleGate(PuzzleGate {
                blocked_direction: Direction::North,
                required_key: None,
                solved: false,
            }),
        );
        let err = engine.interact(run.id, gate).expect_err("nothing opens it");
        assert!(matches!(err, ActionError::Precondition(Precondition::GateUnsolvable)));
    }

    #[test]
    fn traps_disarm_unless_they_fire_on_touch() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = here(&engine, run.id);
        let trap = |timing| {
            ObjectKind::Trap(Trap {
                timing,
                health_delta: -3,
                sanity_delta: -3,
                state: TrapState::Armed,
            })
        };
        let quiet = insert_object(&mut engine, run.id, room, trap(TrapTiming::OnSearch));
        let touchy = insert_object(&mut engine, run.id, room, trap(TrapTiming::OnInteract));

        let report = engine.interact(run.id, quiet).expect("disarm");
        assert!(report.events.contains(&EventKind::TrapDisarmed { object: quiet }));
        let report = engine.interact(run.id, touchy).expect("fires");
        assert!(report.events.iter().any(|event| matches!(
            event,
            EventKind::TrapTriggered { object, .. } if *object == touchy
        )));

        let err = engine.interact(run.id, quiet).expect_err("spent");
        assert!(matches!(err, ActionError::Precondition(Precondition::TrapNotArmed)));
    }

    #[test]
    fn campfire_restores_once() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let room = here(&engine, run.id);
        set_stats(&mut engine, run.id, PlayerStats { health: 50, sanity: 50, morality: 0 });
        let fire =
            insert_object(&mut engine, run.id, room, ObjectKind::Campfire(Campfire::default()));

        engine.interact(run.id, fire).expect("rest");
        let stats = engine.run(run.id).expect("run").stats;
        assert_eq!(stats.health, 65);
        assert!(stats.sanity > 50);

        let err = engine.interact(run.id, fire).expect_err("consumed");
        assert!(matches!(err, ActionError::Precondition(Precondition::CampfireConsumed)));
    }

    #[test]
    fn objects_elsewhere_are_out_of_reach() {
        let (mut engine, run) = engine_with_run(1234, "normal");
        let start = engine.current_room(run.id).expect("room");
        let east = start.exit(Direction::East).expect("chain exit");
        let fire =
            insert_object(&mut engine, run.id, east, ObjectKind::Campfire(Campfire::default()));
        let err = engine.interact(run.id, fire).expect_err("not here");
        assert!(matches!(
            err,
            ActionError::Precondition(Precondition::ObjectNotHere(id)) if id == fire
        ));
    }
}
