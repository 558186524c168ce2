use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Round identifiers are 1-based and index the static round table
pub type RoundId = u8;
pub type TeamName = String;
pub type NoticeId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPhase {
    NotStarted,
    Running,
    Expired,
}

/// Category of a transient status message shown by the presentation layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One accepted flag, kept as an append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRecord {
    pub round: RoundId,
    pub flag: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub name: TeamName,
    pub score: u32,
    pub rounds_solved: usize,
}

/// Final results surfaced when the countdown runs out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub team: TeamName,
    pub score: u32,
    pub rounds_solved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundStatus {
    pub id: RoundId,
    pub title: String,
    pub points: u32,
    pub solved: bool,
}

/// Everything the presentation layer needs to redraw the game screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub team: Option<TeamName>,
    pub phase: TimerPhase,
    pub time_remaining: u32,
    pub clock: String,
    pub warning: bool,
    pub total_score: u32,
    pub solved_rounds: Vec<RoundId>,
    pub progress_percent: u32,
    pub reset_used: bool,
    pub rounds: Vec<RoundStatus>,
}
