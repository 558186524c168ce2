use super::AppState;
use crate::error::{GameError, GameResult};
use crate::rounds::EXTERNAL_ROUND;
use crate::session::TeamSession;
use crate::types::MessageKind;
use chrono::Utc;

impl AppState {
    /// Grant a completion reported by the advanced challenge page, if one is
    /// waiting and the round is not solved yet. Returns the points granted.
    ///
    /// Granted regardless of the countdown: the advanced challenge can be
    /// finished before the timer starts or after it runs out.
    pub(super) async fn take_external_completion(&self, session: &mut TeamSession) -> Option<u32> {
        if session.ledger.is_solved(EXTERNAL_ROUND) {
            return None;
        }

        let completion = match self.inbox.poll_external_completion().await {
            Ok(Some(completion)) => completion,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Failed to read advanced challenge inbox: {}", e);
                return None;
            }
        };

        let points = session
            .ledger
            .record_solve(completion.round, completion.flag, Utc::now())?;
        tracing::info!(
            "Team {} completed the advanced challenge (+{})",
            session.team_name,
            points
        );
        self.notify(
            MessageKind::Success,
            format!("Advanced challenge completed! +{} points", points),
        );
        Some(points)
    }

    /// Record a completion from the advanced challenge page and apply it to
    /// the loaded team right away.
    pub async fn post_external_completion(&self, flag: &str) -> GameResult<Option<u32>> {
        let flag = flag.trim();
        if flag.is_empty() {
            return Err(GameError::EmptyInput);
        }

        if let Err(e) = self.inbox.post_external_completion(flag).await {
            tracing::error!("Failed to record advanced challenge completion: {}", e);
            self.notify(MessageKind::Error, "Progress could not be saved on this device");
            return Ok(None);
        }

        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            // Picked up when a team registers or the page reloads
            return Ok(None);
        };

        let granted = self.take_external_completion(session).await;
        if granted.is_some() {
            self.persist(session).await;
            self.publish(Some(&*session)).await;
        }
        Ok(granted)
    }
}
