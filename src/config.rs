//! Runtime configuration loaded from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Literal the player must type to confirm the one-time reset
pub const RESET_CONFIRMATION: &str = "RESET";

const DEFAULT_GAME_SECONDS: u32 = 5400;
const DEFAULT_AUTOSAVE_SECONDS: u32 = 10;
const DEFAULT_WARNING_SECONDS: u32 = 600;
const DEFAULT_NOTICE_DISMISS_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Address the local presentation server binds to
    pub bind_addr: SocketAddr,
    /// File backing the device's key-value storage
    pub data_file: PathBuf,
    /// Directory with the presentation assets
    pub static_dir: PathBuf,
    /// Length of a game
    pub game_seconds: u32,
    /// Persist the countdown whenever the remaining time is a multiple of this (0 disables)
    pub autosave_seconds: u32,
    /// Remaining time at which the "10 minutes left" warning fires
    pub warning_seconds: u32,
    /// How long notices stay on screen
    pub notice_dismiss: Duration,
    /// Whether the clear-all debug operation is available
    pub allow_debug_clear: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 6574)),
            data_file: PathBuf::from("data/ctf_storage.json"),
            static_dir: PathBuf::from("static"),
            game_seconds: DEFAULT_GAME_SECONDS,
            autosave_seconds: DEFAULT_AUTOSAVE_SECONDS,
            warning_seconds: DEFAULT_WARNING_SECONDS,
            notice_dismiss: Duration::from_millis(DEFAULT_NOTICE_DISMISS_MS),
            allow_debug_clear: false,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Positive integer from the environment; zero or garbage falls back
fn env_positive<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env_string(name).map(|v| v.parse::<T>()) {
        Some(Ok(value)) if value > T::default() => value,
        Some(_) => {
            tracing::warn!("Ignoring invalid value for {}", name);
            default
        }
        None => default,
    }
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match env_string("CTF_BIND_ADDR").map(|v| v.parse::<SocketAddr>()) {
            Some(Ok(addr)) => addr,
            Some(Err(e)) => {
                tracing::warn!("Invalid CTF_BIND_ADDR ({}), using {}", e, defaults.bind_addr);
                defaults.bind_addr
            }
            None => defaults.bind_addr,
        };

        let allow_debug_clear = env_string("CTF_ALLOW_DEBUG_CLEAR")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if allow_debug_clear {
            tracing::warn!("Debug clear-all is ENABLED - all CTF data can be wiped");
        }

        Self {
            bind_addr,
            data_file: env_string("CTF_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            static_dir: env_string("CTF_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            game_seconds: env_positive("CTF_GAME_SECONDS", DEFAULT_GAME_SECONDS),
            autosave_seconds: env_positive("CTF_AUTOSAVE_SECONDS", DEFAULT_AUTOSAVE_SECONDS),
            warning_seconds: env_positive("CTF_WARNING_SECONDS", DEFAULT_WARNING_SECONDS),
            notice_dismiss: Duration::from_millis(env_positive(
                "CTF_NOTICE_DISMISS_MS",
                DEFAULT_NOTICE_DISMISS_MS,
            )),
            allow_debug_clear,
        }
    }
}
