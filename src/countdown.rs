//! Countdown state machine and reload reconciliation.
//!
//! `NotStarted -> Running -> Expired`. A running countdown is advanced either
//! by a one-second tick or by the wall-clock time that passed while nothing
//! was observing it; both go through [`Countdown::advance`], so expiry is
//! decided in exactly one place.

use crate::error::GameError;
use crate::types::TimerPhase;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    phase: TimerPhase,
}

/// Result of advancing the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Countdown was not running; nothing changed
    Idle,
    Running { remaining: u32 },
    /// This advance took the countdown to zero
    Expired,
}

/// Outcome of reconciling a persisted countdown at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Countdown was not running when saved
    NotRunning,
    Resumed { elapsed: u64, remaining: u32 },
    ExpiredWhileAway { elapsed: u64 },
}

impl Countdown {
    pub fn new(total_seconds: u32) -> Self {
        Self {
            remaining: total_seconds,
            phase: TimerPhase::NotStarted,
        }
    }

    /// Rebuild from persisted fields. Zero remaining always means expired.
    pub fn restore(remaining: u32, running: bool) -> Self {
        let phase = if remaining == 0 {
            TimerPhase::Expired
        } else if running {
            TimerPhase::Running
        } else {
            TimerPhase::NotStarted
        };
        Self { remaining, phase }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_expired(&self) -> bool {
        self.phase == TimerPhase::Expired
    }

    /// Enter `Running`. Resume mode skips the already-running guard.
    pub fn start(&mut self, resume: bool) -> Result<(), GameError> {
        match self.phase {
            TimerPhase::Expired => Err(GameError::TimeExpired),
            TimerPhase::Running if !resume => Err(GameError::AlreadyRunning),
            _ => {
                self.phase = TimerPhase::Running;
                Ok(())
            }
        }
    }

    pub fn tick(&mut self) -> Advance {
        self.advance(1)
    }

    pub fn reconcile(&mut self, elapsed_seconds: u64) -> Advance {
        self.advance(elapsed_seconds)
    }

    /// Subtract elapsed seconds from a running countdown and check for expiry
    fn advance(&mut self, seconds: u64) -> Advance {
        if self.phase != TimerPhase::Running {
            return Advance::Idle;
        }

        if seconds >= u64::from(self.remaining) {
            self.remaining = 0;
            self.phase = TimerPhase::Expired;
            return Advance::Expired;
        }

        // seconds < remaining, which fits in u32
        self.remaining -= seconds as u32;
        Advance::Running {
            remaining: self.remaining,
        }
    }

    /// Back to a full, stopped countdown
    pub fn reset(&mut self, total_seconds: u32) {
        *self = Self::new(total_seconds);
    }
}

/// Whole seconds between `last_updated` and `now`.
///
/// A missing timestamp or one in the future counts as no time passed.
pub fn elapsed_since(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    last_updated
        .map(|at| (now - at).num_seconds().max(0) as u64)
        .unwrap_or(0)
}

/// Reconcile a freshly loaded countdown against the wall clock
pub fn recover(
    countdown: &mut Countdown,
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Recovery {
    if !countdown.is_running() {
        return Recovery::NotRunning;
    }

    let elapsed = elapsed_since(last_updated, now);
    match countdown.reconcile(elapsed) {
        Advance::Running { remaining } => Recovery::Resumed { elapsed, remaining },
        Advance::Expired => Recovery::ExpiredWhileAway { elapsed },
        Advance::Idle => Recovery::NotRunning,
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
