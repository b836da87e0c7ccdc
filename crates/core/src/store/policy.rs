use super::*;

impl GameStore {
    /// After a new round: anyone over the ceiling goes out and may rejoin
    /// until the next round is recorded.
    pub(super) fn eliminate_over_ceiling(&mut self, events: &mut EventBus) {
        let ceiling = self.state.settings.max_points;
        let over: Vec<(PlayerId, i64)> = self
            .state
            .registry
            .seating()
            .into_iter()
            .map(|player| (player.id.clone(), self.state.ledger.total_for(&player.id)))
            .filter(|(_, total)| *total > ceiling)
            .collect();
        for (player_id, total) in over {
            if self.state.registry.mark_out(&player_id) {
                tracing::info!(player_id = %player_id, total, "player eliminated");
                self.rejoin_eligible.insert(player_id.clone());
                Self::push(events, Event::PlayerEliminated { player_id, total });
            }
        }
    }

    /// Full pass after an edit, deletion or restore: every player's out flag
    /// is re-derived from their total, in both directions.
    pub(super) fn recompute_standing(&mut self, events: &mut EventBus) {
        let ceiling = self.state.settings.max_points;
        let roster: Vec<(PlayerId, bool, i64)> = self
            .state
            .registry
            .players()
            .iter()
            .map(|p| (p.id.clone(), p.is_out, self.state.ledger.total_for(&p.id)))
            .collect();
        for (player_id, was_out, total) in roster {
            let over = total > ceiling;
            if over && !was_out {
                self.state.registry.mark_out(&player_id);
                tracing::info!(player_id = %player_id, total, "player eliminated on recompute");
                self.rejoin_eligible.insert(player_id.clone());
                Self::push(events, Event::PlayerEliminated { player_id, total });
            } else if !over && was_out {
                self.state.registry.return_to_seat(&player_id);
                tracing::info!(player_id = %player_id, total, "player back under the ceiling");
                self.rejoin_eligible.remove(&player_id);
                Self::push(events, Event::PlayerReinstated { player_id });
            }
        }
        self.state.registry.compact();
        self.check_game_over(events);
    }

    /// One active player left wins, none left ends the game without a winner,
    /// two or more reopen a finished game. Only meaningful once rounds exist.
    pub(super) fn check_game_over(&mut self, events: &mut EventBus) {
        let seating = self.state.registry.seating();
        let last_standing = match seating.as_slice() {
            [only] => Some(only.id.clone()),
            _ => None,
        };
        let active_count = seating.len();
        if self.state.ledger.is_empty() || active_count >= 2 {
            if self.state.is_game_over {
                tracing::info!(active_count, "game resumed");
            }
            self.state.is_game_over = false;
            self.state.game_winner_id = None;
            return;
        }
        if self.state.is_game_over && self.state.game_winner_id == last_standing {
            return;
        }
        self.state.is_game_over = true;
        self.state.game_winner_id = last_standing.clone();
        match last_standing {
            Some(player_id) => {
                tracing::info!(player_id = %player_id, "game won");
                Self::push(events, Event::GameWon { player_id });
            }
            None => {
                tracing::info!("game ended with every player out");
                Self::push(events, Event::GameEnded);
            }
        }
    }

    /// Re-admits an eliminated player at one above the highest active total.
    ///
    /// Only the player's entry in the latest round is adjusted, so the
    /// ledger total lands exactly on the target.
    pub fn rejoin_player(&mut self, player_id: &PlayerId, events: &mut EventBus) -> bool {
        if !self.rejoin_eligible.contains(player_id) {
            return false;
        }
        let seat = match self.state.registry.get(player_id) {
            Some(player) if player.is_out => player
                .original_column_order
                .unwrap_or(player.column_order),
            _ => return false,
        };
        if self.state.ledger.is_empty() {
            return false;
        }
        let target = highest_active_total(&self.state.registry, &self.state.ledger) + 1;
        let current_total = self.state.ledger.total_for(player_id);
        let current_last = self.state.ledger.last_score_for(player_id);
        let adjusted = target - current_total + current_last;
        self.state.ledger.append_to_last_round(player_id, adjusted);
        self.state.registry.reinstate(player_id, seat);
        let seating = self.state.registry.seating();
        self.state.rotation.point_at(&seating, player_id);
        self.rejoin_eligible.remove(player_id);
        tracing::info!(player_id = %player_id, total = target, "player rejoined");
        Self::push(
            events,
            Event::PlayerRejoined {
                player_id: player_id.clone(),
                total: target,
            },
        );
        self.check_game_over(events);
        self.commit();
        true
    }
}
