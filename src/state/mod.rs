mod game;
mod inbox;
mod score;
mod submission;
mod team;

pub use submission::SubmitOutcome;

use crate::config::GameConfig;
use crate::protocol::ServerMessage;
use crate::session::{unregistered_snapshot, TeamSession};
use crate::store::{CompletionInbox, SessionStore};
use crate::types::{MessageKind, SessionSnapshot};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// The session controller.
///
/// Every operation takes the `session` lock for its whole duration, so
/// events (ticks, submissions, resets) are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GameConfig>,
    /// Currently registered team, if any
    pub session: Arc<Mutex<Option<TeamSession>>>,
    store: Arc<dyn SessionStore>,
    inbox: Arc<dyn CompletionInbox>,
    /// The one live countdown task
    countdown_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Notifications for the presentation layer
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(
        config: GameConfig,
        store: Arc<dyn SessionStore>,
        inbox: Arc<dyn CompletionInbox>,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            config: Arc::new(config),
            session: Arc::new(Mutex::new(None)),
            store,
            inbox,
            countdown_task: Arc::new(Mutex::new(None)),
            broadcast: tx,
        }
    }

    /// Current session snapshot for the presentation layer
    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        self.snapshot_of(session.as_ref())
    }

    fn snapshot_of(&self, session: Option<&TeamSession>) -> SessionSnapshot {
        match session {
            Some(s) => s.snapshot(self.config.warning_seconds),
            None => unregistered_snapshot(self.config.game_seconds),
        }
    }

    /// Send a message to every connected client
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(msg);
    }

    /// Raise a transient status message
    pub fn notify(&self, kind: MessageKind, text: impl Into<String>) {
        self.broadcast_to_all(self.notice(kind, None, text.into()));
    }

    pub fn notice(&self, kind: MessageKind, code: Option<String>, text: String) -> ServerMessage {
        ServerMessage::Notice {
            id: ulid::Ulid::new().to_string(),
            kind,
            code,
            text,
            dismiss_after_ms: self.config.notice_dismiss.as_millis() as u64,
        }
    }

    /// Write the session to storage, stamping `last_updated`.
    ///
    /// A failed write keeps the in-memory state and tells the player.
    async fn persist(&self, session: &mut TeamSession) {
        let now = Utc::now();
        let stored = session.to_persisted(now);
        match self.store.put(&session.team_name, &stored).await {
            Ok(()) => session.last_updated = Some(now),
            Err(e) => {
                tracing::error!("Failed to save session for {}: {}", session.team_name, e);
                self.notify(
                    MessageKind::Error,
                    "Progress could not be saved on this device",
                );
            }
        }
    }

    /// Push the session snapshot and a freshly computed leaderboard
    async fn publish(&self, session: Option<&TeamSession>) {
        self.broadcast_to_all(ServerMessage::SessionState {
            session: self.snapshot_of(session),
        });
        let rows = self.rank_with(session).await;
        self.broadcast_to_all(ServerMessage::Leaderboard { rows });
    }
}
