use super::AppState;
use crate::config::RESET_CONFIRMATION;
use crate::countdown::{format_clock, Advance};
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::session::TeamSession;
use crate::types::MessageKind;
use std::time::Duration;

const TICK_PERIOD: Duration = Duration::from_secs(1);

fn time_left_warning(seconds: u32) -> String {
    if seconds >= 60 && seconds % 60 == 0 {
        format!("Only {} minutes remaining!", seconds / 60)
    } else {
        format!("Only {} remaining!", format_clock(seconds))
    }
}

impl AppState {
    /// Start the countdown.
    ///
    /// An interactive start while the countdown is already running is
    /// rejected; resume mode is what a reload uses and skips that check.
    pub async fn start_timer(&self, resume: bool) -> GameResult<()> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(GameError::NotRegistered)?;

        session.countdown.start(resume)?;
        self.arm_countdown().await;
        self.persist(session).await;

        if resume {
            tracing::info!("Countdown resumed for {}", session.team_name);
            self.notify(MessageKind::Info, "Timer resumed from previous session");
        } else {
            tracing::info!(
                "Countdown started for {} ({}s)",
                session.team_name,
                session.countdown.remaining()
            );
            self.notify(MessageKind::Success, "Timer started! Good luck!");
        }

        self.publish(Some(&*session)).await;
        Ok(())
    }

    /// Replace any live countdown task with a fresh one-second ticker
    pub(super) async fn arm_countdown(&self) {
        let mut task = self.countdown_task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let state = self.clone();
        *task = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                interval.tick().await;
                if !state.tick().await {
                    break;
                }
            }
        }));
    }

    /// Cancel the live countdown task, if any
    pub(super) async fn disarm_countdown(&self) {
        if let Some(task) = self.countdown_task.lock().await.take() {
            task.abort();
        }
    }

    /// Stop the countdown task and write the loaded session out, so a later
    /// start measures the time away from this moment.
    pub async fn shutdown(&self) {
        let mut guard = self.session.lock().await;
        self.disarm_countdown().await;
        if let Some(session) = guard.as_mut() {
            self.persist(session).await;
            tracing::info!("Saved session for {} on shutdown", session.team_name);
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns whether the countdown is still running.
    pub async fn tick(&self) -> bool {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return false;
        };

        match session.countdown.tick() {
            Advance::Idle => false,
            Advance::Running { remaining } => {
                self.broadcast_to_all(ServerMessage::TimerTick {
                    remaining,
                    clock: format_clock(remaining),
                    warning: remaining <= self.config.warning_seconds,
                });

                if remaining == self.config.warning_seconds {
                    self.notify(MessageKind::Warning, time_left_warning(remaining));
                }

                // An interval of zero turns autosave off
                if remaining.checked_rem(self.config.autosave_seconds) == Some(0) {
                    self.persist(session).await;
                }
                true
            }
            Advance::Expired => {
                self.end_game(session).await;
                self.publish(Some(&*session)).await;
                // This task is the countdown; let it finish on its own
                self.countdown_task.lock().await.take();
                false
            }
        }
    }

    /// Close out a game whose countdown reached zero
    pub(super) async fn end_game(&self, session: &mut TeamSession) {
        tracing::info!(
            "Game over for {}: {} points, {} rounds",
            session.team_name,
            session.ledger.total_score(),
            session.ledger.solved_count()
        );

        self.persist(session).await;
        self.notify(MessageKind::Error, "Time's up! Game over.");
        self.broadcast_to_all(ServerMessage::GameOver {
            summary: session.summary(),
        });
    }

    /// Use the team's single reset: wipe the ledger and restore a full,
    /// stopped countdown.
    ///
    /// Only allowed before the countdown starts or after it ran out, and only
    /// with the exact confirmation literal.
    pub async fn reset_game(&self, confirmation: &str) -> GameResult<()> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(GameError::NotRegistered)?;

        if session.reset_used {
            return Err(GameError::ResetAlreadyUsed);
        }
        if session.countdown.is_running() && session.countdown.remaining() > 0 {
            return Err(GameError::ResetBlocked);
        }
        if confirmation != RESET_CONFIRMATION {
            return Err(GameError::ResetCancelled);
        }

        self.disarm_countdown().await;
        session.ledger.clear();
        session.countdown.reset(self.config.game_seconds);
        session.reset_used = true;
        self.persist(session).await;

        tracing::warn!("Team {} used its reset", session.team_name);
        self.notify(
            MessageKind::Warning,
            "Game reset! This was your only reset chance.",
        );
        self.publish(Some(&*session)).await;
        Ok(())
    }
}
