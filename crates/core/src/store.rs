use crate::{
    decode_snapshot, encode_snapshot, highest_active_total, standings, Event, EventBus,
    GameSettings, GameState, IdSource, LedgerError, Player, PlayerId, PlayerStanding,
    RegistryError, RoundId, SettingsError, SnapshotStore, SNAPSHOT_KEY,
};
use std::collections::HashSet;
use thiserror::Error;

mod policy;
mod roster;
mod rounds;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("the game is over")]
    GameOver,
    #[error("need at least two active players, have {0}")]
    NotEnoughPlayers(usize),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is out")]
    PlayerOut(PlayerId),
    #[error("no score given for player {0}")]
    MissingScore(PlayerId),
}

/// Aggregate root. Every mutation runs to completion, bumps the version and
/// writes the snapshot through the backend.
#[derive(Debug)]
pub struct GameStore {
    state: GameState,
    rejoin_eligible: HashSet<PlayerId>,
    ids: IdSource,
    backend: Box<dyn SnapshotStore>,
    version: u64,
}

impl GameStore {
    pub fn open(backend: Box<dyn SnapshotStore>) -> Self {
        Self::open_with_ids(backend, IdSource::from_entropy())
    }

    /// Like [`GameStore::open`] with reproducible player ids.
    pub fn open_seeded(backend: Box<dyn SnapshotStore>, seed: u64) -> Self {
        Self::open_with_ids(backend, IdSource::from_seed(seed))
    }

    fn open_with_ids(backend: Box<dyn SnapshotStore>, ids: IdSource) -> Self {
        let state = match backend.load(SNAPSHOT_KEY) {
            Ok(Some(blob)) => match decode_snapshot(&blob) {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(error = %err, "saved game unreadable, starting fresh");
                    GameState::default()
                }
            },
            Ok(None) => {
                tracing::debug!("no saved game, starting fresh");
                GameState::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load saved game, starting fresh");
                GameState::default()
            }
        };
        Self {
            state,
            rejoin_eligible: HashSet::new(),
            ids,
            backend,
            version: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &GameSettings {
        &self.state.settings
    }

    /// Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn seating(&self) -> Vec<&Player> {
        self.state.registry.seating()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.state.registry.get(id)
    }

    pub fn find_player(&self, name: &str) -> Option<&Player> {
        self.state.registry.find_by_name(name)
    }

    pub fn standings(&self) -> Vec<PlayerStanding> {
        standings(
            &self.state.registry,
            &self.state.ledger,
            &self.state.settings,
            &self.rejoin_eligible,
        )
    }

    pub fn standing(&self, id: &PlayerId) -> Option<PlayerStanding> {
        self.standings().into_iter().find(|row| &row.player_id == id)
    }

    pub fn active_standings(&self) -> Vec<PlayerStanding> {
        self.standings().into_iter().filter(|row| !row.is_out).collect()
    }

    pub fn out_standings(&self) -> Vec<PlayerStanding> {
        self.standings().into_iter().filter(|row| row.is_out).collect()
    }

    pub fn total_for(&self, id: &PlayerId) -> i64 {
        self.state.ledger.total_for(id)
    }

    pub fn open_card_player(&self) -> Option<&Player> {
        self.state.rotation.open_card_player(&self.seating())
    }

    pub fn dealer(&self) -> Option<&Player> {
        self.state.rotation.dealer(&self.seating())
    }

    pub fn latest_round_id(&self) -> Option<RoundId> {
        self.state.ledger.latest_round_id()
    }

    pub fn would_duplicate_winner(
        &self,
        round_id: RoundId,
        player_id: &PlayerId,
        score: i64,
    ) -> bool {
        self.state
            .ledger
            .would_duplicate_winner(round_id, player_id, score)
    }

    pub fn is_rejoin_eligible(&self, id: &PlayerId) -> bool {
        self.rejoin_eligible.contains(id)
    }

    /// Score offered to a player joining an existing game.
    pub fn suggested_join_score(&self) -> i64 {
        highest_active_total(&self.state.registry, &self.state.ledger) + 1
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over
    }

    pub fn game_winner(&self) -> Option<&Player> {
        self.state
            .game_winner_id
            .as_ref()
            .and_then(|id| self.state.registry.get(id))
    }

    pub fn initialize(&mut self, settings: GameSettings) -> Result<(), GameError> {
        settings.validate()?;
        self.state.settings = settings;
        self.state.is_game_started = true;
        tracing::debug!(
            max_points = settings.max_points,
            drop_points = settings.drop_points,
            "game initialized"
        );
        self.commit();
        Ok(())
    }

    /// Clears rounds and brings everyone back in; players and settings stay.
    pub fn start_new_game(&mut self) {
        self.state.ledger.clear();
        self.state.registry.reset_for_new_game();
        self.state.rotation.reset();
        self.state.is_game_over = false;
        self.state.game_winner_id = None;
        self.rejoin_eligible.clear();
        tracing::info!("new game started");
        self.commit();
    }

    pub fn reset(&mut self) {
        self.state = GameState::default();
        self.rejoin_eligible.clear();
        tracing::info!("game reset");
        self.commit();
    }

    fn commit(&mut self) {
        self.version += 1;
        let blob = match encode_snapshot(&self.state) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, version = self.version, "snapshot not persisted");
                return;
            }
        };
        if let Err(err) = self.backend.save(SNAPSHOT_KEY, &blob) {
            tracing::warn!(error = %err, version = self.version, "snapshot not persisted");
        }
    }

    fn push(events: &mut EventBus, event: Event) {
        tracing::debug!(?event, "game event");
        events.push(event);
    }
}
