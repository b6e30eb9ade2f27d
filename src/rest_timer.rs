//src/rest_timer.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

use crate::config::DEFAULT_REST_SECONDS;

/// How long the "rest complete" state stays visible before the timer stops.
pub const EXPIRY_GRACE_MS: i64 = 2_000;
/// Poll period used by interactive countdowns.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);
/// Quick-pick durations offered by the CLI.
pub const QUICK_TIMES: [u32; 5] = [30, 60, 90, 120, 180];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    #[error("Rest duration must be greater than zero seconds.")]
    ZeroDuration,
    #[error("Rest timer is not running.")]
    NotRunning,
}

/// Something that can get the user's attention when rest is over.
pub trait RestAlert {
    /// Returns `false` when no alert could be delivered.
    fn alert(&self) -> bool;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl RestAlert for TerminalBell {
    fn alert(&self) -> bool {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .is_ok()
    }
}

/// Alert that does nothing; used when alerts are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl RestAlert for Silent {
    fn alert(&self) -> bool {
        false
    }
}

/// Outcome of polling the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Idle,
    /// Seconds left, rounded up.
    Counting(u32),
    /// Reached zero; waiting out the grace delay.
    Expired,
    /// Stopped automatically on this tick.
    Finished,
}

/// Rest countdown between sets. Remaining time is recomputed from the
/// absolute end instant, so a missed poll never makes it drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    duration_seconds: u32,
    #[serde(skip)]
    end: Option<DateTime<Utc>>,
    #[serde(skip)]
    alerted_at: Option<DateTime<Utc>>,
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::with_default_duration(DEFAULT_REST_SECONDS)
    }
}

impl RestTimer {
    #[must_use]
    pub fn with_default_duration(duration_seconds: u32) -> Self {
        Self {
            duration_seconds: duration_seconds.max(1),
            end: None,
            alerted_at: None,
        }
    }

    pub const fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub const fn is_running(&self) -> bool {
        self.end.is_some()
    }

    pub const fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Starts (or restarts) the countdown. The duration becomes the default
    /// for later starts.
    /// # Errors
    /// `TimerError::ZeroDuration` if `duration_seconds` is zero.
    pub fn start(&mut self, duration_seconds: u32, now: DateTime<Utc>) -> Result<(), TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.duration_seconds = duration_seconds;
        self.end = Some(now + Duration::seconds(i64::from(duration_seconds)));
        self.alerted_at = None;
        tracing::debug!(duration_seconds, "rest timer started");
        Ok(())
    }

    /// Changes the default duration without touching a running countdown.
    /// # Errors
    /// `TimerError::ZeroDuration` if `duration_seconds` is zero.
    pub fn set_default_duration(&mut self, duration_seconds: u32) -> Result<(), TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.duration_seconds = duration_seconds;
        Ok(())
    }

    /// Starts with the current default duration.
    pub fn start_default(&mut self, now: DateTime<Utc>) {
        let end = now + Duration::seconds(i64::from(self.duration_seconds));
        self.end = Some(end);
        self.alerted_at = None;
    }

    pub fn stop(&mut self) {
        self.end = None;
        self.alerted_at = None;
    }

    /// Pushes the end out by `extra_seconds` without resetting the countdown.
    /// # Errors
    /// `TimerError::NotRunning` if there is nothing to extend.
    pub fn extend(&mut self, extra_seconds: u32, now: DateTime<Utc>) -> Result<(), TimerError> {
        let end = self.end.ok_or(TimerError::NotRunning)?;
        let new_end = end + Duration::seconds(i64::from(extra_seconds));
        let seconds = ceil_seconds(new_end - now).max(1);
        self.start(seconds, now)
    }

    /// Whole seconds left, rounded up and clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> u32 {
        self.end.map_or(0, |end| ceil_seconds(end - now))
    }

    /// Fraction of the rest period already elapsed, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_running() {
            return 0.0;
        }
        let left = f64::from(self.remaining(now));
        (1.0 - left / f64::from(self.duration_seconds)).clamp(0.0, 1.0)
    }

    /// Polls the timer. Fires `alert` once when the countdown reaches zero
    /// and stops the timer once the grace delay has passed.
    pub fn tick(&mut self, now: DateTime<Utc>, alert: &dyn RestAlert) -> TimerTick {
        if self.end.is_none() {
            return TimerTick::Idle;
        }
        let left = self.remaining(now);
        if left > 0 {
            return TimerTick::Counting(left);
        }
        match self.alerted_at {
            None => {
                self.alerted_at = Some(now);
                if !alert.alert() {
                    tracing::debug!("rest alert unavailable, continuing silently");
                }
                TimerTick::Expired
            }
            Some(at) if now - at >= Duration::milliseconds(EXPIRY_GRACE_MS) => {
                self.stop();
                TimerTick::Finished
            }
            Some(_) => TimerTick::Expired,
        }
    }
}

/// `ceil(delta / 1s)` clamped to zero.
fn ceil_seconds(delta: Duration) -> u32 {
    let millis = delta.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from((millis + 999) / 1000).unwrap_or(u32::MAX)
}

/// Formats seconds as `m:ss`.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
