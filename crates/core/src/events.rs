use crate::{PlayerId, RoundId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    RoundWon {
        round_id: RoundId,
        player_id: PlayerId,
    },
    RoundDeleted { round_id: RoundId },
    PlayerEliminated { player_id: PlayerId, total: i64 },
    PlayerReinstated { player_id: PlayerId },
    PlayerRejoined { player_id: PlayerId, total: i64 },
    PlayerRestored { player_id: PlayerId },
    GameWon { player_id: PlayerId },
    GameEnded,
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
