use crate::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use time::OffsetDateTime;

pub type RoundId = u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub player_id: PlayerId,
    pub score: i64,
}

impl RoundScore {
    pub fn new(player_id: PlayerId, score: i64) -> Self {
        Self { player_id, score }
    }
}

/// One player's score in one round, as kept in a tombstone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntry {
    pub round_id: RoundId,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub scores: Vec<RoundScore>,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Round {
    pub fn score_for(&self, player_id: &PlayerId) -> Option<i64> {
        self.scores
            .iter()
            .find(|entry| &entry.player_id == player_id)
            .map(|entry| entry.score)
    }

    fn refresh_winner(&mut self) {
        self.winner_id = self
            .scores
            .iter()
            .find(|entry| entry.score == 0)
            .map(|entry| entry.player_id.clone());
    }

    fn upsert(&mut self, player_id: &PlayerId, score: i64) {
        match self
            .scores
            .iter_mut()
            .find(|entry| &entry.player_id == player_id)
        {
            Some(entry) => entry.score = score,
            None => self.scores.push(RoundScore::new(player_id.clone(), score)),
        }
        // The recorded winner keeps the round while their zero stands.
        let winner_holds = self
            .winner_id
            .as_ref()
            .is_some_and(|winner| self.score_for(winner) == Some(0));
        if !winner_holds {
            self.refresh_winner();
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("round has no scores")]
    EmptyRound,
    #[error("round needs exactly one winner with score 0, found none")]
    NoWinner,
    #[error("round needs exactly one winner with score 0, found {0}")]
    MultipleWinners(usize),
    #[error("score {score} for player {player_id} is negative")]
    NegativeScore { player_id: PlayerId, score: i64 },
    #[error("{0:?} is not a valid score")]
    InvalidScore(String),
    #[error("player {0} appears twice in the round")]
    DuplicatePlayer(PlayerId),
    #[error("round {0} does not exist")]
    UnknownRound(RoundId),
}

/// Parses caller text into a non-negative score.
pub fn parse_score(text: &str) -> Result<i64, LedgerError> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| LedgerError::InvalidScore(text.to_string()))?;
    if value < 0 {
        return Err(LedgerError::InvalidScore(text.to_string()));
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundLedger {
    #[serde(default)]
    rounds: Vec<Round>,
}

impl RoundLedger {
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn get(&self, round_id: RoundId) -> Option<&Round> {
        self.rounds.iter().find(|round| round.id == round_id)
    }

    pub fn last(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn latest_round_id(&self) -> Option<RoundId> {
        self.rounds.last().map(|round| round.id)
    }

    pub fn append(
        &mut self,
        scores: Vec<RoundScore>,
        created_at: OffsetDateTime,
    ) -> Result<&Round, LedgerError> {
        if scores.is_empty() {
            return Err(LedgerError::EmptyRound);
        }
        let mut seen = HashSet::new();
        for entry in &scores {
            if entry.score < 0 {
                return Err(LedgerError::NegativeScore {
                    player_id: entry.player_id.clone(),
                    score: entry.score,
                });
            }
            if !seen.insert(&entry.player_id) {
                return Err(LedgerError::DuplicatePlayer(entry.player_id.clone()));
            }
        }
        match scores.iter().filter(|entry| entry.score == 0).count() {
            0 => return Err(LedgerError::NoWinner),
            1 => {}
            count => return Err(LedgerError::MultipleWinners(count)),
        }
        let mut round = Round {
            id: self.next_id(),
            scores,
            winner_id: None,
            created_at,
        };
        round.refresh_winner();
        self.rounds.push(round);
        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// True when setting `player_id` to `score` would leave two zero scores in the round.
    pub fn would_duplicate_winner(
        &self,
        round_id: RoundId,
        player_id: &PlayerId,
        score: i64,
    ) -> bool {
        if score != 0 {
            return false;
        }
        self.get(round_id).is_some_and(|round| {
            round
                .scores
                .iter()
                .any(|entry| entry.score == 0 && &entry.player_id != player_id)
        })
    }

    /// Replaces an existing entry. Returns `Ok(false)` when the player has no
    /// score in that round.
    pub fn edit_score(
        &mut self,
        round_id: RoundId,
        player_id: &PlayerId,
        score: i64,
    ) -> Result<bool, LedgerError> {
        if score < 0 {
            return Err(LedgerError::NegativeScore {
                player_id: player_id.clone(),
                score,
            });
        }
        if self.would_duplicate_winner(round_id, player_id, score) {
            return Err(LedgerError::MultipleWinners(2));
        }
        let round = self
            .rounds
            .iter_mut()
            .find(|round| round.id == round_id)
            .ok_or(LedgerError::UnknownRound(round_id))?;
        if round.score_for(player_id).is_none() {
            return Ok(false);
        }
        round.upsert(player_id, score);
        Ok(true)
    }

    pub fn delete_round(&mut self, round_id: RoundId) -> bool {
        let Some(index) = self.rounds.iter().position(|round| round.id == round_id) else {
            return false;
        };
        self.rounds.remove(index);
        self.renumber();
        true
    }

    /// Writes a score into the latest round without opening a new one.
    pub fn append_to_last_round(&mut self, player_id: &PlayerId, score: i64) -> bool {
        match self.rounds.last_mut() {
            Some(round) => {
                round.upsert(player_id, score);
                true
            }
            None => false,
        }
    }

    pub fn total_for(&self, player_id: &PlayerId) -> i64 {
        self.rounds
            .iter()
            .filter_map(|round| round.score_for(player_id))
            .sum()
    }

    pub fn last_score_for(&self, player_id: &PlayerId) -> i64 {
        self.rounds
            .last()
            .and_then(|round| round.score_for(player_id))
            .unwrap_or(0)
    }

    /// Removes every score held by the player, returning them for a tombstone.
    pub fn strip_player(&mut self, player_id: &PlayerId) -> Vec<RoundEntry> {
        let mut history = Vec::new();
        for round in &mut self.rounds {
            if let Some(score) = round.score_for(player_id) {
                history.push(RoundEntry {
                    round_id: round.id,
                    score,
                });
                round.scores.retain(|entry| &entry.player_id != player_id);
                round.refresh_winner();
            }
        }
        history
    }

    /// Replays tombstoned scores into rounds that still exist.
    pub fn restore_player(&mut self, player_id: &PlayerId, history: &[RoundEntry]) {
        for entry in history {
            if let Some(round) = self.rounds.iter_mut().find(|r| r.id == entry.round_id) {
                round.upsert(player_id, entry.score);
            }
        }
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }

    fn next_id(&self) -> RoundId {
        self.rounds.last().map_or(1, |round| round.id + 1)
    }

    fn renumber(&mut self) {
        for (idx, round) in self.rounds.iter_mut().enumerate() {
            round.id = idx as RoundId + 1;
        }
    }
}
