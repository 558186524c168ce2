use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::rounds;
use crate::types::{MessageKind, RoundId, TimerPhase};
use chrono::Utc;

/// What happened to a flag that passed the precondition checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Correct { points: u32, total_score: u32 },
    /// Wrong flag; nothing was recorded
    Incorrect { well_formed: bool },
}

impl AppState {
    /// Check a flag for a round and score it if correct.
    ///
    /// A round scores at most once: resubmitting a solved round is reported
    /// as a warning and changes nothing.
    pub async fn submit_flag(&self, round: RoundId, text: &str) -> GameResult<SubmitOutcome> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(GameError::NotRegistered)?;

        match session.countdown.phase() {
            TimerPhase::NotStarted => return Err(GameError::NotStarted),
            TimerPhase::Expired => return Err(GameError::TimeExpired),
            TimerPhase::Running => {}
        }
        if session.ledger.is_solved(round) {
            return Err(GameError::AlreadySolved(round));
        }

        let flag = text.trim();
        if flag.is_empty() {
            return Err(GameError::EmptyInput);
        }

        if !rounds::validate(round, flag) {
            let well_formed = rounds::looks_like_flag(flag);
            tracing::info!("Incorrect flag for round {} from {}", round, session.team_name);
            self.notify(MessageKind::Error, "Incorrect flag. Try again!");
            self.broadcast_to_all(ServerMessage::FlagRejected { round, well_formed });
            return Ok(SubmitOutcome::Incorrect { well_formed });
        }

        let Some(points) = session
            .ledger
            .record_solve(round, flag.to_string(), Utc::now())
        else {
            // validate() only accepts rounds in the table, which are unsolved here
            return Err(GameError::AlreadySolved(round));
        };
        let total_score = session.ledger.total_score();
        self.persist(session).await;

        tracing::info!(
            "Team {} solved round {} (+{}, total {})",
            session.team_name,
            round,
            points,
            total_score
        );
        self.notify(MessageKind::Success, format!("Correct! +{} points", points));
        self.broadcast_to_all(ServerMessage::RoundSolved {
            round,
            points,
            total_score,
            progress_percent: session.ledger.progress_percent(),
        });
        if session.ledger.all_solved() {
            self.notify(
                MessageKind::Success,
                "Congratulations! You've completed all challenges!",
            );
        }

        self.publish(Some(&*session)).await;
        Ok(SubmitOutcome::Correct {
            points,
            total_score,
        })
    }
}
