use super::*;
use crate::RoundScore;
use time::OffsetDateTime;

impl GameStore {
    /// Records a new round: one score per active player, exactly one zero.
    pub fn submit_round(
        &mut self,
        scores: Vec<RoundScore>,
        events: &mut EventBus,
    ) -> Result<RoundId, GameError> {
        if self.state.is_game_over {
            return Err(GameError::GameOver);
        }
        let active_count = self.state.registry.active_count();
        if active_count < 2 {
            return Err(GameError::NotEnoughPlayers(active_count));
        }
        for entry in &scores {
            match self.state.registry.get(&entry.player_id) {
                None => return Err(GameError::UnknownPlayer(entry.player_id.clone())),
                Some(player) if player.is_out => {
                    return Err(GameError::PlayerOut(entry.player_id.clone()))
                }
                Some(_) => {}
            }
        }
        if let Some(missing) = self
            .state
            .registry
            .seating()
            .into_iter()
            .find(|player| !scores.iter().any(|entry| entry.player_id == player.id))
        {
            return Err(GameError::MissingScore(missing.id.clone()));
        }

        let round = self
            .state
            .ledger
            .append(scores, OffsetDateTime::now_utc())?;
        let round_id = round.id;
        let winner = round.winner_id.clone();
        tracing::debug!(round_id, "round recorded");
        if let Some(player_id) = winner {
            Self::push(events, Event::RoundWon { round_id, player_id });
        }

        self.rejoin_eligible.clear();
        self.eliminate_over_ceiling(events);
        self.check_game_over(events);
        let active_count = self.state.registry.active_count();
        self.state.rotation.advance(active_count);
        self.commit();
        Ok(round_id)
    }

    /// Rewrites one historical score and re-derives who is in or out.
    ///
    /// Any round may be edited here; limiting edits to the latest round is
    /// left to the caller.
    pub fn edit_score(
        &mut self,
        round_id: RoundId,
        player_id: &PlayerId,
        score: i64,
        events: &mut EventBus,
    ) -> Result<bool, GameError> {
        let changed = self.state.ledger.edit_score(round_id, player_id, score)?;
        if !changed {
            return Ok(false);
        }
        tracing::debug!(round_id, player_id = %player_id, score, "score edited");
        self.recompute_standing(events);
        self.commit();
        Ok(true)
    }

    pub fn delete_round(&mut self, round_id: RoundId, events: &mut EventBus) -> bool {
        if !self.state.ledger.delete_round(round_id) {
            return false;
        }
        self.state.registry.forget_round(round_id);
        tracing::debug!(round_id, "round deleted");
        Self::push(events, Event::RoundDeleted { round_id });
        self.recompute_standing(events);
        self.commit();
        true
    }
}
