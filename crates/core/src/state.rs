use crate::{GameSettings, PlayerId, PlayerRegistry, Rotation, RoundLedger};
use serde::{Deserialize, Serialize};

/// The persisted snapshot. Everything else is derived from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub settings: GameSettings,
    #[serde(flatten)]
    pub registry: PlayerRegistry,
    #[serde(flatten)]
    pub ledger: RoundLedger,
    #[serde(default, rename = "currentOpenCardPlayerIndex")]
    pub rotation: Rotation,
    #[serde(default)]
    pub is_game_started: bool,
    #[serde(default)]
    pub is_game_over: bool,
    #[serde(default)]
    pub game_winner_id: Option<PlayerId>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }
}
