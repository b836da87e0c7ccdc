use super::*;
use crate::Admission;

impl GameStore {
    pub fn add_player(&mut self, name: &str, events: &mut EventBus) -> Result<PlayerId, GameError> {
        let (player_id, _restored) = self.admit(name, events)?;
        self.check_game_over(events);
        self.commit();
        Ok(player_id)
    }

    /// Adds a player to a game already under way. A fresh player is written
    /// into the latest round with `join_score`; a restored one keeps their
    /// old history instead. Either way they take the open card.
    pub fn join_mid_game(
        &mut self,
        name: &str,
        join_score: i64,
        events: &mut EventBus,
    ) -> Result<PlayerId, GameError> {
        if join_score < 0 {
            return Err(LedgerError::InvalidScore(join_score.to_string()).into());
        }
        let restoring = self.state.registry.tombstone(name).is_some();
        let decided = self
            .state
            .ledger
            .last()
            .is_some_and(|round| round.winner_id.is_some());
        if join_score == 0 && decided && !restoring {
            return Err(LedgerError::MultipleWinners(2).into());
        }
        let (player_id, restored) = self.admit(name, events)?;
        if !restored && self.state.ledger.append_to_last_round(&player_id, join_score) {
            tracing::debug!(player_id = %player_id, join_score, "join score recorded");
        }
        let seating = self.state.registry.seating();
        self.state.rotation.point_at(&seating, &player_id);
        self.check_game_over(events);
        self.commit();
        Ok(player_id)
    }

    /// Removes a player for good, keeping a tombstone so re-adding the same
    /// name brings their scores back.
    pub fn remove_player(&mut self, player_id: &PlayerId, events: &mut EventBus) -> bool {
        if self.state.registry.get(player_id).is_none() {
            return false;
        }
        let history = self.state.ledger.strip_player(player_id);
        if let Some(player) = self.state.registry.remove(player_id, history) {
            tracing::info!(player_id = %player_id, name = %player.name, "player removed");
        }
        self.rejoin_eligible.remove(player_id);
        self.check_game_over(events);
        self.commit();
        true
    }

    pub fn reorder_players(&mut self, ordered: &[PlayerId]) -> Result<(), GameError> {
        self.state.registry.reorder(ordered)?;
        tracing::debug!(count = ordered.len(), "seating reordered");
        self.commit();
        Ok(())
    }

    pub fn set_open_card_player(&mut self, player_id: &PlayerId) -> bool {
        let seating = self.state.registry.seating();
        if !self.state.rotation.point_at(&seating, player_id) {
            return false;
        }
        self.commit();
        true
    }

    pub fn set_dealer(&mut self, player_id: &PlayerId) -> bool {
        let seating = self.state.registry.seating();
        if !self.state.rotation.point_after(&seating, player_id) {
            return false;
        }
        self.commit();
        true
    }

    fn admit(&mut self, name: &str, events: &mut EventBus) -> Result<(PlayerId, bool), GameError> {
        let fresh_id = self.ids.next_id();
        match self.state.registry.add(name, fresh_id)? {
            Admission::Fresh(player_id) => {
                tracing::debug!(player_id = %player_id, name, "player added");
                Ok((player_id, false))
            }
            Admission::Restored(removed) => {
                let player_id = removed.player.id.clone();
                self.state.ledger.restore_player(&player_id, &removed.scores);
                tracing::info!(player_id = %player_id, name, "player restored from history");
                Self::push(
                    events,
                    Event::PlayerRestored {
                        player_id: player_id.clone(),
                    },
                );
                self.recompute_standing(events);
                Ok((player_id, true))
            }
        }
    }
}
