use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

/// Calls from the presentation layer into the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    RegisterTeam {
        name: String,
    },
    StartTimer,
    SubmitFlag {
        round: RoundId,
        flag: String,
    },
    ResetGame {
        confirmation: String,
    },
    /// Ask for a fresh session snapshot and leaderboard
    RequestState,
    /// Wipe every stored session (only honoured when enabled in config)
    DebugClearAll,
}

/// Notifications from the controller to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session: SessionSnapshot,
        leaderboard: Vec<LeaderboardRow>,
        server_now: String,
    },
    SessionState {
        session: SessionSnapshot,
    },
    TimerTick {
        remaining: u32,
        clock: String,
        warning: bool,
    },
    RoundSolved {
        round: RoundId,
        points: u32,
        total_score: u32,
        progress_percent: u32,
    },
    /// An incorrect flag; `well_formed` says whether it at least looked like a flag
    FlagRejected {
        round: RoundId,
        well_formed: bool,
    },
    Leaderboard {
        rows: Vec<LeaderboardRow>,
    },
    /// Transient status message, dismissed by the client after `dismiss_after_ms`
    Notice {
        id: NoticeId,
        kind: MessageKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        text: String,
        dismiss_after_ms: u64,
    },
    GameOver {
        summary: GameSummary,
    },
    DataCleared {
        removed: usize,
    },
    Error {
        code: String,
        msg: String,
    },
}
