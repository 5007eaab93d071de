use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::Serialize;

/// Cooldown applied when a quota error carries no reset hint.
///
/// Upstream reset windows are usually hours long, so this fallback tends to
/// under-back-off; the next attempt simply re-arms it.
pub const DEFAULT_COOLDOWN_SECS: i64 = 60;

/// Process-wide relayer quota state. Self-clears once `reset_at` passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub is_limited: bool,
    pub reset_at: Option<DateTime<Utc>>,
    pub remaining_units: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub is_limited: bool,
    /// Seconds until the limit lifts, when limited.
    pub resets_in: Option<i64>,
    pub remaining_units: Option<u64>,
}

impl RateLimitState {
    /// Whether the limit is in force at `now`. Clears expired state.
    pub fn is_active_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_limited {
            return false;
        }
        match self.reset_at {
            Some(reset_at) if now < reset_at => true,
            _ => {
                *self = Self::default();
                false
            }
        }
    }

    /// Arm the limit from a quota error message. Returns the reset time.
    pub fn record_at(&mut self, message: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let reset_at = parse_reset_secs(message)
            .and_then(TimeDelta::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or_else(|| now + TimeDelta::seconds(DEFAULT_COOLDOWN_SECS));

        self.is_limited = true;
        self.reset_at = Some(reset_at);
        self.remaining_units = parse_remaining_units(message);
        reset_at
    }

    pub fn status_at(&mut self, now: DateTime<Utc>) -> RateLimitStatus {
        let is_limited = self.is_active_at(now);
        RateLimitStatus {
            is_limited,
            resets_in: self
                .reset_at
                .filter(|_| is_limited)
                .map(|r| (r - now).num_seconds().max(0)),
            remaining_units: self.remaining_units,
        }
    }
}

// ---------------------------------------------------------------------------
// Relayer error classification
// ---------------------------------------------------------------------------

/// Kind of a relayer/transaction failure, decided from its text. The relayer
/// exposes no structured error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayerFailure {
    RateLimited,
    OracleNotReady,
    Other,
}

static RATE_LIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:returned|status)\s*:?\s*429\b|quota exceeded|rate limit|too many requests")
        .expect("valid rate-limit pattern")
});

static ORACLE_NOT_READY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)result for condition not received yet").expect("valid oracle pattern")
});

static RESETS_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)resets in\s+(\d+)\s*(seconds?|secs?|s|minutes?|mins?|m|hours?|h)\b")
        .expect("valid reset pattern")
});

static UNITS_REMAINING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+units remaining").expect("valid units pattern")
});

pub fn classify_relayer_error(message: &str) -> RelayerFailure {
    if RATE_LIMITED.is_match(message) {
        RelayerFailure::RateLimited
    } else if ORACLE_NOT_READY.is_match(message) {
        RelayerFailure::OracleNotReady
    } else {
        RelayerFailure::Other
    }
}

/// "resets in N seconds|minutes|hours" → seconds. `None` when absent or out of range.
fn parse_reset_secs(message: &str) -> Option<i64> {
    let caps = RESETS_IN.captures(message)?;
    let value: i64 = caps[1].parse().ok()?;

    let multiplier = match caps[2].to_ascii_lowercase().chars().next() {
        Some('h') => 3_600,
        Some('m') => 60,
        _ => 1,
    };
    value.checked_mul(multiplier)
}

/// "N units remaining" → N.
fn parse_remaining_units(message: &str) -> Option<u64> {
    UNITS_REMAINING.captures(message)?[1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: &str =
        "relayer returned 429: quota exceeded: 0 units remaining, resets in 120 seconds";

    #[test]
    fn limit_holds_until_reset_elapses() {
        let t0 = Utc::now();
        let mut state = RateLimitState::default();
        assert!(!state.is_active_at(t0));

        let reset_at = state.record_at(QUOTA, t0);
        assert_eq!(reset_at, t0 + TimeDelta::seconds(120));
        assert_eq!(state.remaining_units, Some(0));

        assert!(state.is_active_at(t0));
        assert!(state.is_active_at(t0 + TimeDelta::seconds(119)));
        assert!(!state.is_active_at(t0 + TimeDelta::seconds(120)));
        assert_eq!(state, RateLimitState::default());
    }

    #[test]
    fn missing_hint_uses_default_cooldown() {
        let t0 = Utc::now();
        let mut state = RateLimitState::default();
        let reset_at = state.record_at("429 Too Many Requests", t0);
        assert_eq!(reset_at, t0 + TimeDelta::seconds(DEFAULT_COOLDOWN_SECS));
        assert_eq!(state.remaining_units, None);
    }

    #[test]
    fn reset_hint_units() {
        assert_eq!(parse_reset_secs("Resets in 3 hours"), Some(10_800));
        assert_eq!(parse_reset_secs("resets in 15 minutes"), Some(900));
        assert_eq!(parse_reset_secs("resets in 42s"), Some(42));
        assert_eq!(parse_reset_secs("resets in soon"), None);
        assert_eq!(parse_remaining_units("12 units remaining"), Some(12));
        assert_eq!(parse_remaining_units("no units remaining"), None);
    }

    #[test]
    fn out_of_range_hint_falls_back_to_default_cooldown() {
        let t0 = Utc::now();
        let mut state = RateLimitState::default();

        let huge = "429: quota exceeded, resets in 99999999999999999 hours";
        assert_eq!(parse_reset_secs(huge), None);
        let reset_at = state.record_at(huge, t0);
        assert_eq!(reset_at, t0 + TimeDelta::seconds(DEFAULT_COOLDOWN_SECS));

        let overflow = "quota exceeded, resets in 99999999999999999999 seconds";
        assert_eq!(
            state.record_at(overflow, t0),
            t0 + TimeDelta::seconds(DEFAULT_COOLDOWN_SECS)
        );
    }

    #[test]
    fn status_reports_time_left() {
        let t0 = Utc::now();
        let mut state = RateLimitState::default();
        state.record_at(QUOTA, t0);

        let status = state.status_at(t0 + TimeDelta::seconds(20));
        assert!(status.is_limited);
        assert_eq!(status.resets_in, Some(100));

        let status = state.status_at(t0 + TimeDelta::seconds(500));
        assert!(!status.is_limited);
        assert_eq!(status.resets_in, None);
    }

    #[test]
    fn classifies_relayer_errors() {
        assert_eq!(classify_relayer_error(QUOTA), RelayerFailure::RateLimited);
        assert_eq!(
            classify_relayer_error("Rate limit exceeded"),
            RelayerFailure::RateLimited
        );
        assert_eq!(
            classify_relayer_error("execution reverted: result for condition not received yet"),
            RelayerFailure::OracleNotReady
        );
        assert_eq!(
            classify_relayer_error("execution reverted"),
            RelayerFailure::Other
        );
        assert_eq!(
            classify_relayer_error("relayer returned 429: busy"),
            RelayerFailure::RateLimited
        );
    }

    #[test]
    fn status_digits_inside_other_tokens_are_not_rate_limits() {
        for message in [
            "relayer returned 500: nonce 14290 already used",
            "relayer returned 400: invalid signature for transaction 0xab4291",
            "execution reverted: position 429 not found",
        ] {
            assert_eq!(classify_relayer_error(message), RelayerFailure::Other, "{message}");
        }
    }
}
