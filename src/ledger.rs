use crate::rounds::{self, TOTAL_ROUNDS};
use crate::types::{RoundId, SubmissionRecord};
use chrono::{DateTime, Utc};

/// Solved rounds, cumulative score and the accepted-flag log for one team.
///
/// The total is only ever changed together with the solved set, so it always
/// equals the sum of the solved rounds' points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreLedger {
    solved_rounds: Vec<RoundId>,
    total_score: u32,
    submissions: Vec<SubmissionRecord>,
}

impl ScoreLedger {
    /// Rebuild a ledger from stored parts.
    ///
    /// Duplicate and unknown round ids are dropped and the total is recomputed
    /// from what remains; a stored total that disagrees is only logged.
    pub fn from_parts(
        solved_rounds: Vec<RoundId>,
        stored_total: u32,
        submissions: Vec<SubmissionRecord>,
    ) -> Self {
        let mut ledger = Self {
            submissions,
            ..Self::default()
        };

        for round in solved_rounds {
            if rounds::round(round).is_none() || ledger.is_solved(round) {
                tracing::warn!("Dropping invalid or duplicate solved round {}", round);
                continue;
            }
            ledger.solved_rounds.push(round);
            ledger.total_score += rounds::points_for(round);
        }

        if ledger.total_score != stored_total {
            tracing::warn!(
                "Stored total score {} does not match solved rounds, using {}",
                stored_total,
                ledger.total_score
            );
        }

        ledger
    }

    pub fn is_solved(&self, round: RoundId) -> bool {
        self.solved_rounds.contains(&round)
    }

    /// Record a solve. Returns the points gained, or `None` if the round was
    /// already solved or is not in the table.
    pub fn record_solve(
        &mut self,
        round: RoundId,
        flag: String,
        at: DateTime<Utc>,
    ) -> Option<u32> {
        if self.is_solved(round) {
            return None;
        }
        let points = rounds::round(round)?.points;

        self.solved_rounds.push(round);
        self.total_score += points;
        self.submissions.push(SubmissionRecord {
            round,
            flag,
            timestamp: at,
        });
        Some(points)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn solved_rounds(&self) -> &[RoundId] {
        &self.solved_rounds
    }

    pub fn solved_count(&self) -> usize {
        self.solved_rounds.len()
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn submissions(&self) -> &[SubmissionRecord] {
        &self.submissions
    }

    pub fn all_solved(&self) -> bool {
        self.solved_rounds.len() == TOTAL_ROUNDS
    }

    pub fn progress_percent(&self) -> u32 {
        (self.solved_rounds.len() * 100 / TOTAL_ROUNDS) as u32
    }
}
