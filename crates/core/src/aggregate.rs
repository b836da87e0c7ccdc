//! Derived per-player views. Nothing here is stored; every call recomputes
//! from the registry and ledger.

use crate::{GameSettings, Player, PlayerId, PlayerRegistry, RoundLedger};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub is_out: bool,
    pub column_order: usize,
    pub rejoin_count: u32,
    pub total: i64,
    /// The drop penalty still fits under the ceiling.
    pub can_drop: bool,
    pub can_rejoin: bool,
    /// Total a rejoining player would be set to.
    pub rejoin_score: i64,
}

/// Highest running total among active players, 0 when nobody has scored.
pub fn highest_active_total(registry: &PlayerRegistry, ledger: &RoundLedger) -> i64 {
    registry
        .seating()
        .iter()
        .map(|player| ledger.total_for(&player.id))
        .max()
        .unwrap_or(0)
        .max(0)
}

pub fn rejoin_score(registry: &PlayerRegistry, ledger: &RoundLedger) -> i64 {
    highest_active_total(registry, ledger) + 1
}

/// Active players in seat order followed by out players.
pub fn standings(
    registry: &PlayerRegistry,
    ledger: &RoundLedger,
    settings: &GameSettings,
    rejoin_eligible: &HashSet<PlayerId>,
) -> Vec<PlayerStanding> {
    let rejoin_at = rejoin_score(registry, ledger);
    let active_count = registry.active_count();
    let rejoin_affordable = rejoin_at + settings.drop_points <= settings.max_points;
    registry
        .seating()
        .into_iter()
        .chain(registry.out_players())
        .map(|player| {
            let total = ledger.total_for(&player.id);
            let can_rejoin = player.is_out
                && rejoin_eligible.contains(&player.id)
                && rejoin_affordable
                && active_count >= 2;
            standing(player, total, settings, can_rejoin, rejoin_at)
        })
        .collect()
}

fn standing(
    player: &Player,
    total: i64,
    settings: &GameSettings,
    can_rejoin: bool,
    rejoin_score: i64,
) -> PlayerStanding {
    PlayerStanding {
        player_id: player.id.clone(),
        name: player.name.clone(),
        is_out: player.is_out,
        column_order: player.column_order,
        rejoin_count: player.rejoin_count,
        total,
        can_drop: total + settings.drop_points <= settings.max_points,
        can_rejoin,
        rejoin_score,
    }
}
