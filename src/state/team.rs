use super::AppState;
use crate::countdown::{self, Recovery};
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::session::TeamSession;
use crate::types::{MessageKind, SessionSnapshot};
use chrono::Utc;

const MIN_TEAM_NAME_CHARS: usize = 3;

/// Trim and check a team name
fn validate_team_name(name: &str) -> GameResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::Validation(
            "Please enter a team name".to_string(),
        ));
    }
    if name.chars().count() < MIN_TEAM_NAME_CHARS {
        return Err(GameError::Validation(format!(
            "Team name must be at least {} characters",
            MIN_TEAM_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

impl AppState {
    /// Register the team playing on this device.
    ///
    /// Re-registering the same name is a no-op; a session already stored under
    /// that name is picked up instead of starting over.
    pub async fn register_team(&self, name: &str) -> GameResult<SessionSnapshot> {
        let name = validate_team_name(name)?;
        let mut guard = self.session.lock().await;

        if let Some(current) = guard.as_ref() {
            if current.team_name == name {
                return Ok(current.snapshot(self.config.warning_seconds));
            }
            return Err(GameError::Validation(format!(
                "This device is already registered as {}",
                current.team_name
            )));
        }

        tracing::info!("Registering team {}", name);
        if let Err(e) = self.store.set_active_team(Some(&name)).await {
            tracing::error!("Failed to record active team {}: {}", name, e);
        }
        self.notify(
            MessageKind::Success,
            format!("Welcome {}! Good luck!", name),
        );

        self.load_session(&mut guard, name).await;
        Ok(self.snapshot_of(guard.as_ref()))
    }

    /// Pick up the active team from storage, if there is one.
    ///
    /// Run once at startup, before any player interaction.
    pub async fn restore(&self) -> Option<SessionSnapshot> {
        let name = match self.store.active_team().await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::info!("No team registered on this device yet");
                return None;
            }
            Err(e) => {
                tracing::error!("Failed to read active team: {}", e);
                return None;
            }
        };

        let mut guard = self.session.lock().await;
        tracing::info!("Restoring session for team {}", name);
        self.load_session(&mut guard, name).await;
        Some(self.snapshot_of(guard.as_ref()))
    }

    /// Load or create a team's session, reconcile its countdown against the
    /// time that passed since it was saved, and take any pending advanced
    /// challenge completion.
    async fn load_session(&self, guard: &mut Option<TeamSession>, name: String) {
        let stored = match self.store.get(&name).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to read session for {}: {}", name, e);
                None
            }
        };

        let mut session = match stored {
            Some(stored) => TeamSession::from_persisted(name, stored, self.config.game_seconds),
            None => TeamSession::new(name, self.config.game_seconds),
        };

        let recovery = countdown::recover(&mut session.countdown, session.last_updated, Utc::now());
        match recovery {
            Recovery::Resumed { elapsed, remaining } => tracing::info!(
                "Countdown for {} resumed: {}s elapsed while away, {}s left",
                session.team_name,
                elapsed,
                remaining
            ),
            Recovery::ExpiredWhileAway { elapsed } => tracing::info!(
                "Countdown for {} ran out while away ({}s elapsed)",
                session.team_name,
                elapsed
            ),
            Recovery::NotRunning => {}
        }

        self.take_external_completion(&mut session).await;

        // Persist right away so a quick second reload measures from now
        self.persist(&mut session).await;
        let session = guard.insert(session);

        match recovery {
            Recovery::Resumed { .. } => {
                self.arm_countdown().await;
                self.notify(MessageKind::Info, "Timer resumed from previous session");
            }
            Recovery::ExpiredWhileAway { .. } => self.end_game(session).await,
            Recovery::NotRunning => {}
        }

        self.publish(Some(&*session)).await;
    }

    /// Forget everything stored on this device (debug/admin)
    pub async fn clear_all_data(&self) -> Result<usize, crate::store::StoreError> {
        let mut guard = self.session.lock().await;
        self.disarm_countdown().await;

        let removed = self.store.clear_all().await?;
        *guard = None;
        tracing::warn!("All CTF data cleared ({} slots)", removed);

        self.broadcast_to_all(ServerMessage::DataCleared { removed });
        self.publish(None).await;
        Ok(removed)
    }
}
