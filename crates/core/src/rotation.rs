use crate::{Player, PlayerId};
use serde::{Deserialize, Serialize};

/// Index of the open-card holder within the active seating.
///
/// The index is never corrected when the roster changes; it is clamped
/// against whatever seating the caller passes in at read time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Rotation {
    index: usize,
}

impl Rotation {
    pub fn at(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn open_card_position(&self, active_count: usize) -> Option<usize> {
        match active_count {
            0 => None,
            n if self.index < n => Some(self.index),
            _ => Some(0),
        }
    }

    pub fn dealer_position(&self, active_count: usize) -> Option<usize> {
        if active_count < 2 {
            return None;
        }
        let open = self.open_card_position(active_count)?;
        Some((open + active_count - 1) % active_count)
    }

    pub fn open_card_player<'a>(&self, seating: &[&'a Player]) -> Option<&'a Player> {
        self.open_card_position(seating.len())
            .map(|pos| seating[pos])
    }

    pub fn dealer<'a>(&self, seating: &[&'a Player]) -> Option<&'a Player> {
        self.dealer_position(seating.len()).map(|pos| seating[pos])
    }

    pub fn advance(&mut self, active_count: usize) -> bool {
        if active_count < 2 {
            return false;
        }
        self.index = (self.index + 1) % active_count;
        true
    }

    /// Hands the open card to `id`.
    pub fn point_at(&mut self, seating: &[&Player], id: &PlayerId) -> bool {
        match seating.iter().position(|player| &player.id == id) {
            Some(pos) => {
                self.index = pos;
                true
            }
            None => false,
        }
    }

    /// Makes `id` the dealer by handing the open card to the next seat.
    pub fn point_after(&mut self, seating: &[&Player], id: &PlayerId) -> bool {
        match seating.iter().position(|player| &player.id == id) {
            Some(pos) => {
                self.index = (pos + 1) % seating.len();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
