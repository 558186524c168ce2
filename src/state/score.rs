use crate::ledger::ScoreLedger;
use crate::session::TeamSession;
use crate::state::AppState;
use crate::store::PersistedSession;
use crate::types::LeaderboardRow;

/// Order rows by score (descending), then by name
pub fn sort_leaderboard(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
}

/// Leaderboard row for a stored slot.
///
/// The score is recomputed from the solved rounds rather than trusted from
/// `totalScore`, so a slot that only carries a total (no `solvedRounds`)
/// ranks with zero and stays off the board.
fn row_from_stored(stored: PersistedSession) -> Option<LeaderboardRow> {
    if stored.team_name.is_empty() {
        return None;
    }
    let ledger = ScoreLedger::from_parts(stored.solved_rounds, stored.total_score, stored.submissions);
    Some(LeaderboardRow {
        name: stored.team_name,
        score: ledger.total_score(),
        rounds_solved: ledger.solved_count(),
    })
}

impl AppState {
    /// Rank every team with points on this device.
    ///
    /// Built fresh from storage on each call; the in-memory session is added
    /// if its latest state has not reached storage yet.
    pub async fn compute_ranking(&self) -> Vec<LeaderboardRow> {
        let session = self.session.lock().await;
        self.rank_with(session.as_ref()).await
    }

    pub(super) async fn rank_with(&self, current: Option<&TeamSession>) -> Vec<LeaderboardRow> {
        let stored = match self.store.list_all().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to scan stored sessions: {}", e);
                Vec::new()
            }
        };

        let mut rows: Vec<LeaderboardRow> = stored
            .into_iter()
            .filter_map(row_from_stored)
            .filter(|row| row.score > 0)
            .collect();

        if let Some(session) = current {
            let score = session.ledger.total_score();
            if score > 0 && !rows.iter().any(|r| r.name == session.team_name) {
                rows.push(LeaderboardRow {
                    name: session.team_name.clone(),
                    score,
                    rounds_solved: session.ledger.solved_count(),
                });
            }
        }

        sort_leaderboard(&mut rows);
        rows
    }
}
