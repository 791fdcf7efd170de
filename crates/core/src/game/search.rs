//! Searching a room: reveals hidden objects and springs on-search traps.

use super::*;

impl ActionContext<'_> {
    pub(super) fn search_room(&mut self) -> Result<(), ActionError> {
        let mut room = self.current_room()?;
        if room.has_been_searched {
            return Err(Precondition::RoomAlreadySearched.into());
        }

        self.begin_turn();
        let mut revealed = 0;
        for mut object in self.tx.objects_in_room(self.run.id, room.id)? {
            if !object.hidden {
                continue;
            }
            object.hidden = false;
            revealed += 1;
            self.say(format!("You uncover a hidden {}.", object.kind.label()));
            self.tx.put_object(object)?;
        }
        if revealed == 0 {
            self.say("You find nothing new.");
        }

        self.resolve_traps(room.id, TrapTiming::OnSearch)?;
        room.has_been_searched = true;
        let room_id = room.id;
        self.tx.put_room(room)?;
        self.log(EventKind::RoomSearched { room: room_id, revealed })?;
        self.end_turn(false)
    }
}
