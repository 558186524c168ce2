//! WebSocket message dispatch
//!
//! Maps presentation-layer calls onto controller operations. Failures come
//! back to the caller as notices; successes are announced through the
//! broadcast channel so every open tab stays in sync.

use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, SubmitOutcome};
use std::sync::Arc;

fn error_notice(state: &AppState, err: GameError) -> ServerMessage {
    state.notice(err.kind(), Some(err.code().to_string()), err.to_string())
}

/// Handle client messages and return optional response
pub async fn handle_message(msg: ClientMessage, state: &Arc<AppState>) -> Option<ServerMessage> {
    match msg {
        ClientMessage::RegisterTeam { name } => {
            tracing::info!("Team registration: {}", name);
            match state.register_team(&name).await {
                Ok(session) => Some(ServerMessage::SessionState { session }),
                Err(e) => Some(error_notice(state, e)),
            }
        }

        ClientMessage::StartTimer => match state.start_timer(false).await {
            Ok(()) => None,
            Err(e) => Some(error_notice(state, e)),
        },

        ClientMessage::SubmitFlag { round, flag } => {
            tracing::debug!("Flag submitted for round {}", round);
            match state.submit_flag(round, &flag).await {
                Ok(SubmitOutcome::Correct { .. }) | Ok(SubmitOutcome::Incorrect { .. }) => None,
                Err(e) => Some(error_notice(state, e)),
            }
        }

        ClientMessage::ResetGame { confirmation } => {
            match state.reset_game(&confirmation).await {
                Ok(()) => None,
                Err(e) => Some(error_notice(state, e)),
            }
        }

        ClientMessage::RequestState => Some(ServerMessage::SessionState {
            session: state.snapshot().await,
        }),

        ClientMessage::DebugClearAll => {
            if !state.config.allow_debug_clear {
                tracing::warn!("Rejected clear-all request: disabled in config");
                return Some(ServerMessage::Error {
                    code: "DEBUG_DISABLED".to_string(),
                    msg: "Clearing all data is disabled".to_string(),
                });
            }
            match state.clear_all_data().await {
                Ok(_) => None,
                Err(e) => Some(ServerMessage::Error {
                    code: "STORAGE_ERROR".to_string(),
                    msg: e.to_string(),
                }),
            }
        }
    }
}
