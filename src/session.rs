use crate::countdown::{format_clock, Countdown};
use crate::ledger::ScoreLedger;
use crate::rounds::ROUNDS;
use crate::store::PersistedSession;
use crate::types::{GameSummary, RoundStatus, SessionSnapshot, TeamName, TimerPhase};
use chrono::{DateTime, Utc};

/// In-memory state of the registered team
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSession {
    pub team_name: TeamName,
    pub ledger: ScoreLedger,
    pub countdown: Countdown,
    pub reset_used: bool,
    /// When this session was last written to storage
    pub last_updated: Option<DateTime<Utc>>,
}

impl TeamSession {
    /// Fresh session: empty ledger, full stopped countdown
    pub fn new(team_name: TeamName, game_seconds: u32) -> Self {
        Self {
            team_name,
            ledger: ScoreLedger::default(),
            countdown: Countdown::new(game_seconds),
            reset_used: false,
            last_updated: None,
        }
    }

    /// Rebuild from storage, filling in whatever the slot did not have
    pub fn from_persisted(team_name: TeamName, stored: PersistedSession, game_seconds: u32) -> Self {
        if !stored.team_name.is_empty() && stored.team_name != team_name {
            tracing::warn!(
                "Session slot for {} carries team name {}",
                team_name,
                stored.team_name
            );
        }

        // Never hand back more time than a full game
        let remaining = stored
            .time_remaining
            .unwrap_or(game_seconds)
            .min(game_seconds);

        Self {
            team_name,
            ledger: ScoreLedger::from_parts(
                stored.solved_rounds,
                stored.total_score,
                stored.submissions,
            ),
            countdown: Countdown::restore(remaining, stored.timer_running),
            reset_used: stored.reset_used,
            last_updated: stored.last_updated,
        }
    }

    /// Stored form, stamped with `now`
    pub fn to_persisted(&self, now: DateTime<Utc>) -> PersistedSession {
        PersistedSession {
            solved_rounds: self.ledger.solved_rounds().to_vec(),
            total_score: self.ledger.total_score(),
            submissions: self.ledger.submissions().to_vec(),
            team_name: self.team_name.clone(),
            time_remaining: Some(self.countdown.remaining()),
            timer_running: self.countdown.is_running(),
            reset_used: self.reset_used,
            last_updated: Some(now),
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            team: self.team_name.clone(),
            score: self.ledger.total_score(),
            rounds_solved: self.ledger.solved_count(),
        }
    }

    pub fn snapshot(&self, warning_seconds: u32) -> SessionSnapshot {
        let remaining = self.countdown.remaining();
        SessionSnapshot {
            team: Some(self.team_name.clone()),
            phase: self.countdown.phase(),
            time_remaining: remaining,
            clock: format_clock(remaining),
            warning: self.countdown.is_running() && remaining <= warning_seconds,
            total_score: self.ledger.total_score(),
            solved_rounds: self.ledger.solved_rounds().to_vec(),
            progress_percent: self.ledger.progress_percent(),
            reset_used: self.reset_used,
            rounds: round_statuses(|id| self.ledger.is_solved(id)),
        }
    }
}

fn round_statuses(solved: impl Fn(u8) -> bool) -> Vec<RoundStatus> {
    ROUNDS
        .iter()
        .map(|r| RoundStatus {
            id: r.id,
            title: r.title.to_string(),
            points: r.points,
            solved: solved(r.id),
        })
        .collect()
}

/// What the presentation layer shows before a team registers
pub fn unregistered_snapshot(game_seconds: u32) -> SessionSnapshot {
    SessionSnapshot {
        team: None,
        phase: TimerPhase::NotStarted,
        time_remaining: game_seconds,
        clock: format_clock(game_seconds),
        warning: false,
        total_score: 0,
        solved_rounds: Vec::new(),
        progress_percent: 0,
        reset_used: false,
        rounds: round_statuses(|_| false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_persist_and_reload_keeps_everything() {
        let now = Utc::now();
        let mut session = TeamSession::new("Alpha".to_string(), 5400);
        session.countdown.start(false).unwrap();
        session.countdown.tick();
        session
            .ledger
            .record_solve(1, "PPG{PDF_FORENSICS}".to_string(), now);
        session.reset_used = true;

        let stored = session.to_persisted(now);
        let reloaded = TeamSession::from_persisted("Alpha".to_string(), stored, 5400);

        assert_eq!(reloaded.ledger, session.ledger);
        assert_eq!(reloaded.countdown, session.countdown);
        assert!(reloaded.reset_used);
        assert_eq!(reloaded.last_updated, Some(now));
    }

    #[test]
    fn test_missing_fields_load_as_fresh_session() {
        let reloaded =
            TeamSession::from_persisted("Alpha".to_string(), PersistedSession::default(), 5400);

        assert_eq!(reloaded.countdown.remaining(), 5400);
        assert_eq!(reloaded.countdown.phase(), TimerPhase::NotStarted);
        assert_eq!(reloaded.ledger.total_score(), 0);
        assert!(!reloaded.reset_used);
    }

    #[test]
    fn test_stored_time_is_capped_at_full_game() {
        let stored = PersistedSession {
            time_remaining: Some(99_999),
            timer_running: true,
            ..PersistedSession::default()
        };
        let reloaded = TeamSession::from_persisted("Alpha".to_string(), stored, 5400);
        assert_eq!(reloaded.countdown.remaining(), 5400);
    }

    #[test]
    fn test_snapshot_reports_progress_and_warning() {
        let now = Utc::now();
        let stored = PersistedSession {
            solved_rounds: vec![1, 5],
            total_score: 30,
            time_remaining: Some(590),
            timer_running: true,
            last_updated: Some(now - Duration::seconds(1)),
            ..PersistedSession::default()
        };
        let session = TeamSession::from_persisted("Alpha".to_string(), stored, 5400);

        let snapshot = session.snapshot(600);

        assert_eq!(snapshot.progress_percent, 40);
        assert_eq!(snapshot.clock, "00:09:50");
        assert!(snapshot.warning);
        assert_eq!(snapshot.rounds.iter().filter(|r| r.solved).count(), 2);
        assert_eq!(session.summary().rounds_solved, 2);
    }

    #[test]
    fn test_unregistered_snapshot() {
        let snapshot = unregistered_snapshot(5400);
        assert!(snapshot.team.is_none());
        assert_eq!(snapshot.clock, "01:30:00");
        assert_eq!(snapshot.rounds.len(), 5);
    }
}
