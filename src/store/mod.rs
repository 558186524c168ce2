//! Persistent storage of team sessions.
//!
//! The controller only sees the [`SessionStore`] and [`CompletionInbox`]
//! traits; how sessions are laid out in storage is private to the adapter.

mod local;

pub use local::LocalStorage;

use crate::types::{RoundId, SubmissionRecord, TeamName};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Decode a field, falling back to its default when the stored value is
/// `null` or of the wrong type
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a list, keeping the entries that parse. Anything that is not an
/// array reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Stored form of a team session.
///
/// Every field has a default so older or partially written slots still load;
/// a field that is `null` or mistyped reads as missing instead of failing
/// the whole slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default, deserialize_with = "lenient_list")]
    pub solved_rounds: Vec<RoundId>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_score: u32,
    #[serde(default, deserialize_with = "lenient_list")]
    pub submissions: Vec<SubmissionRecord>,
    #[serde(default, deserialize_with = "lenient")]
    pub team_name: TeamName,
    /// Missing means the countdown was never saved (full duration)
    #[serde(default, deserialize_with = "lenient")]
    pub time_remaining: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub timer_running: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub reset_used: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Round completion reported by the advanced challenge page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCompletion {
    pub round: RoundId,
    pub flag: String,
}

/// Keyed repository of team sessions (one slot per team name)
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, team_name: &str) -> StoreResult<Option<PersistedSession>>;

    /// Overwrite the slot for `team_name`
    async fn put(&self, team_name: &str, session: &PersistedSession) -> StoreResult<()>;

    /// Every readable session on the device
    async fn list_all(&self) -> StoreResult<Vec<PersistedSession>>;

    async fn active_team(&self) -> StoreResult<Option<TeamName>>;

    async fn set_active_team(&self, team_name: Option<&str>) -> StoreResult<()>;

    /// Remove every session and the active team pointer. Returns slots removed.
    async fn clear_all(&self) -> StoreResult<usize>;
}

/// One-shot inbox written by the advanced challenge page
#[async_trait]
pub trait CompletionInbox: Send + Sync {
    /// Take the pending completion, if any. A returned value is gone from the inbox.
    async fn poll_external_completion(&self) -> StoreResult<Option<ExternalCompletion>>;

    async fn post_external_completion(&self, flag: &str) -> StoreResult<()>;
}
