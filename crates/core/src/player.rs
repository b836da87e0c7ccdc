use crate::{RoundEntry, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub is_out: bool,
    pub column_order: usize,
    /// Seat held when eliminated; restored on rejoin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_column_order: Option<usize>,
    #[serde(default)]
    pub rejoin_count: u32,
}

/// Snapshot of a permanently removed player and every score they held.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemovedPlayer {
    pub player: Player,
    #[serde(default)]
    pub scores: Vec<RoundEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Fresh(PlayerId),
    Restored(RemovedPlayer),
}

impl Admission {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            Self::Fresh(id) => id,
            Self::Restored(removed) => &removed.player.id,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("player name is empty")]
    EmptyName,
    #[error("a player named {0:?} already exists")]
    DuplicateName(String),
    #[error("seating order must list every active player exactly once")]
    IncompleteOrder,
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRegistry {
    #[serde(default)]
    players: Vec<Player>,
    #[serde(default, with = "tombstones")]
    removed_players: BTreeMap<String, RemovedPlayer>,
}

impl PlayerRegistry {
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| &player.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        let key = normalize_name(name);
        self.players
            .iter()
            .find(|player| normalize_name(&player.name) == key)
    }

    /// Active players sorted by seat.
    pub fn seating(&self) -> Vec<&Player> {
        let mut active: Vec<&Player> = self.players.iter().filter(|p| !p.is_out).collect();
        active.sort_by_key(|player| player.column_order);
        active
    }

    pub fn out_players(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_out).collect()
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_out).count()
    }

    pub fn tombstone(&self, name: &str) -> Option<&RemovedPlayer> {
        self.removed_players.get(&normalize_name(name))
    }

    pub fn tombstones(&self) -> impl Iterator<Item = &RemovedPlayer> {
        self.removed_players.values()
    }

    /// Registers `name`, reviving a tombstone of the same name when one exists.
    /// `fresh_id` is only used when nothing is restored.
    pub fn add(&mut self, name: &str, fresh_id: PlayerId) -> Result<Admission, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.find_by_name(name).is_some() {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let seat = self.active_count();
        if let Some(removed) = self.removed_players.remove(&normalize_name(name)) {
            let mut player = removed.player.clone();
            player.name = name.to_string();
            player.is_out = false;
            player.column_order = seat;
            player.original_column_order = None;
            self.players.push(player);
            return Ok(Admission::Restored(removed));
        }
        self.players.push(Player {
            id: fresh_id.clone(),
            name: name.to_string(),
            is_out: false,
            column_order: seat,
            original_column_order: None,
            rejoin_count: 0,
        });
        Ok(Admission::Fresh(fresh_id))
    }

    /// Drops the player and files a tombstone carrying `scores`.
    pub fn remove(&mut self, id: &PlayerId, scores: Vec<RoundEntry>) -> Option<Player> {
        let index = self.players.iter().position(|player| &player.id == id)?;
        let player = self.players.remove(index);
        self.removed_players.insert(
            normalize_name(&player.name),
            RemovedPlayer {
                player: player.clone(),
                scores,
            },
        );
        self.compact();
        Some(player)
    }

    /// Follows a round deletion: entries for `round_id` are dropped and later
    /// rounds shift down one, matching the ledger's renumbering.
    pub fn forget_round(&mut self, round_id: RoundId) {
        for removed in self.removed_players.values_mut() {
            removed.scores.retain(|entry| entry.round_id != round_id);
            for entry in &mut removed.scores {
                if entry.round_id > round_id {
                    entry.round_id -= 1;
                }
            }
        }
    }

    pub fn reorder(&mut self, ordered: &[PlayerId]) -> Result<(), RegistryError> {
        let active: HashSet<&PlayerId> = self
            .players
            .iter()
            .filter(|p| !p.is_out)
            .map(|p| &p.id)
            .collect();
        let listed: HashSet<&PlayerId> = ordered.iter().collect();
        if ordered.len() != active.len() || listed != active {
            return Err(RegistryError::IncompleteOrder);
        }
        for (seat, id) in ordered.iter().enumerate() {
            if let Some(player) = self.player_mut(id) {
                player.column_order = seat;
            }
        }
        Ok(())
    }

    pub fn mark_out(&mut self, id: &PlayerId) -> bool {
        let Some(player) = self.player_mut(id) else {
            return false;
        };
        if player.is_out {
            return false;
        }
        player.is_out = true;
        player.original_column_order = Some(player.column_order);
        self.compact();
        true
    }

    /// Re-admits an out player at `at`, counting it as a rejoin.
    pub fn reinstate(&mut self, id: &PlayerId, at: usize) -> bool {
        if !self.seat(id, at) {
            return false;
        }
        if let Some(player) = self.player_mut(id) {
            player.rejoin_count = player.rejoin_count.saturating_add(1);
        }
        true
    }

    /// Puts an out player back at their remembered seat without counting a rejoin.
    pub fn return_to_seat(&mut self, id: &PlayerId) -> bool {
        let Some(player) = self.get(id) else {
            return false;
        };
        let at = player
            .original_column_order
            .unwrap_or_else(|| self.active_count());
        self.seat(id, at)
    }

    /// Renumbers active seats to a dense 0-based sequence, keeping relative order.
    pub fn compact(&mut self) {
        let mut active: Vec<usize> = (0..self.players.len())
            .filter(|&idx| !self.players[idx].is_out)
            .collect();
        active.sort_by_key(|&idx| self.players[idx].column_order);
        for (seat, idx) in active.into_iter().enumerate() {
            self.players[idx].column_order = seat;
        }
    }

    /// Brings every player back in for a fresh game and forgets tombstones.
    pub fn reset_for_new_game(&mut self) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by_key(|&idx| {
            let player = &self.players[idx];
            let seat = player.original_column_order.unwrap_or(player.column_order);
            (player.is_out, seat)
        });
        for (seat, idx) in order.into_iter().enumerate() {
            let player = &mut self.players[idx];
            player.is_out = false;
            player.original_column_order = None;
            player.column_order = seat;
        }
        self.removed_players.clear();
    }

    fn seat(&mut self, id: &PlayerId, at: usize) -> bool {
        match self.get(id) {
            Some(player) if player.is_out => {}
            _ => return false,
        }
        let at = at.min(self.active_count());
        for player in self.players.iter_mut().filter(|p| !p.is_out) {
            if player.column_order >= at {
                player.column_order += 1;
            }
        }
        if let Some(player) = self.player_mut(id) {
            player.is_out = false;
            player.column_order = at;
            player.original_column_order = None;
        }
        true
    }

    fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| &player.id == id)
    }
}

/// Tombstones persist as a plain list and are keyed by normalized name in memory.
mod tombstones {
    use super::{normalize_name, RemovedPlayer};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub(super) fn serialize<S>(
        map: &BTreeMap<String, RemovedPlayer>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.values())
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<String, RemovedPlayer>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<RemovedPlayer>::deserialize(deserializer)?;
        Ok(list
            .into_iter()
            .map(|removed| (normalize_name(&removed.player.name), removed))
            .collect())
    }
}
