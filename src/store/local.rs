use super::{
    CompletionInbox, ExternalCompletion, PersistedSession, SessionStore, StoreResult,
};
use crate::rounds::EXTERNAL_ROUND;
use crate::types::TeamName;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const ACTIVE_TEAM_KEY: &str = "ctfTeamName";
const SESSION_PREFIX: &str = "ctf_gamestate_";
/// Everything the clear-all operation removes starts with this
const CTF_PREFIX: &str = "ctf_";
/// Unreadable session slots are copied to `<key>.corrupt` before anything overwrites them
const CORRUPT_SUFFIX: &str = ".corrupt";
const ADVANCED_SOLVED_KEY: &str = "advancedChallengeSolved";
const ADVANCED_FLAG_KEY: &str = "advancedChallengeFlag";

fn session_key(team_name: &str) -> String {
    format!("{}{}", SESSION_PREFIX, team_name)
}

/// String slots keyed like browser local storage, optionally mirrored to a
/// JSON file on every write.
pub struct LocalStorage {
    path: Option<PathBuf>,
    slots: RwLock<BTreeMap<String, String>>,
}

impl LocalStorage {
    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            slots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open file-backed storage, creating it on first write.
    ///
    /// A file that cannot be parsed is moved to `<file>.corrupt` and the
    /// storage starts empty.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let slots = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(slots) => {
                    tracing::info!("Loaded {} storage slots from {}", slots.len(), path.display());
                    slots
                }
                Err(e) => {
                    let mut aside = path.clone().into_os_string();
                    aside.push(".corrupt");
                    tracing::warn!(
                        "Storage file {} is unreadable ({}), moving it to {:?}",
                        path.display(),
                        e,
                        aside
                    );
                    tokio::fs::rename(&path, &aside).await?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No storage file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            slots: RwLock::new(slots),
        })
    }

    /// Raw slot access, for tests and tooling that act like another page
    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.slots.read().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: String) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        slots.insert(key.to_string(), value);
        self.flush(&slots).await
    }

    /// Write the whole slot map out (temp file + rename). Caller holds the write lock.
    async fn flush(&self, slots: &BTreeMap<String, String>) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(slots)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn parse_session(key: &str, raw: &str) -> Option<PersistedSession> {
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session slot {}: {}", key, e);
            None
        }
    }
}

#[async_trait]
impl SessionStore for LocalStorage {
    async fn get(&self, team_name: &str) -> StoreResult<Option<PersistedSession>> {
        let key = session_key(team_name);
        let mut slots = self.slots.write().await;
        let Some(raw) = slots.get(&key).cloned() else {
            return Ok(None);
        };
        if let Some(session) = parse_session(&key, &raw) {
            return Ok(Some(session));
        }

        let aside = format!("{}{}", key, CORRUPT_SUFFIX);
        tracing::warn!("Keeping unreadable session slot {} as {}", key, aside);
        slots.insert(aside, raw);
        self.flush(&slots).await?;
        Ok(None)
    }

    async fn put(&self, team_name: &str, session: &PersistedSession) -> StoreResult<()> {
        let json = serde_json::to_string(session)?;
        let mut slots = self.slots.write().await;
        slots.insert(session_key(team_name), json);
        self.flush(&slots).await
    }

    async fn list_all(&self) -> StoreResult<Vec<PersistedSession>> {
        let slots = self.slots.read().await;
        Ok(slots
            .iter()
            .filter(|(key, _)| key.starts_with(SESSION_PREFIX) && !key.ends_with(CORRUPT_SUFFIX))
            .filter_map(|(key, raw)| parse_session(key, raw))
            .collect())
    }

    async fn active_team(&self) -> StoreResult<Option<TeamName>> {
        Ok(self
            .slots
            .read()
            .await
            .get(ACTIVE_TEAM_KEY)
            .filter(|name| !name.is_empty())
            .cloned())
    }

    async fn set_active_team(&self, team_name: Option<&str>) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        match team_name {
            Some(name) => slots.insert(ACTIVE_TEAM_KEY.to_string(), name.to_string()),
            None => slots.remove(ACTIVE_TEAM_KEY),
        };
        self.flush(&slots).await
    }

    async fn clear_all(&self) -> StoreResult<usize> {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(CTF_PREFIX) && key != ACTIVE_TEAM_KEY);
        let removed = before - slots.len();
        self.flush(&slots).await?;

        tracing::info!("Cleared {} storage slots", removed);
        Ok(removed)
    }
}

#[async_trait]
impl CompletionInbox for LocalStorage {
    async fn poll_external_completion(&self) -> StoreResult<Option<ExternalCompletion>> {
        let mut slots = self.slots.write().await;

        let solved = slots.get(ADVANCED_SOLVED_KEY).is_some_and(|v| v == "true");
        let flag = slots
            .get(ADVANCED_FLAG_KEY)
            .filter(|f| !f.is_empty())
            .cloned();

        let Some(flag) = flag.filter(|_| solved) else {
            return Ok(None);
        };

        slots.remove(ADVANCED_SOLVED_KEY);
        slots.remove(ADVANCED_FLAG_KEY);
        self.flush(&slots).await?;

        Ok(Some(ExternalCompletion {
            round: EXTERNAL_ROUND,
            flag,
        }))
    }

    async fn post_external_completion(&self, flag: &str) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        slots.insert(ADVANCED_SOLVED_KEY.to_string(), "true".to_string());
        slots.insert(ADVANCED_FLAG_KEY.to_string(), flag.to_string());
        self.flush(&slots).await
    }
}
