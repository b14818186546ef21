//! PIN lockout state machine.
//!
//! Failed verifications move `Unlocked { failures }` towards `Locked { until }`.
//! The lock is a fixed window: failures recorded while locked do not push
//! `until` further out. Once `until` has passed the state reads as a fresh
//! `Unlocked { failures: 0 }`.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::minutes(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    Unlocked { failures: u32 },
    Locked { until: DateTime<Utc> },
}

impl Default for LockoutState {
    fn default() -> Self {
        LockoutState::Unlocked { failures: 0 }
    }
}

impl LockoutState {
    /// Rebuild the state from its persisted columns. A stored lock wins over the counter.
    pub fn from_columns(failures: i32, locked_until: Option<DateTime<Utc>>) -> Self {
        match locked_until {
            Some(until) => LockoutState::Locked { until },
            None => LockoutState::Unlocked {
                failures: failures.max(0) as u32,
            },
        }
    }

    /// `(failed_attempts, locked_until)` as stored.
    pub fn to_columns(&self) -> (i32, Option<DateTime<Utc>>) {
        match *self {
            LockoutState::Unlocked { failures } => (failures as i32, None),
            LockoutState::Locked { until } => (0, Some(until)),
        }
    }

    /// Collapse an expired lock into a clean unlocked state.
    pub fn settle(self, now: DateTime<Utc>) -> Self {
        match self {
            LockoutState::Locked { until } if until <= now => LockoutState::default(),
            other => other,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.settle(now), LockoutState::Locked { .. })
    }

    /// Whole seconds left on the lock, rounded up. Zero when unlocked.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.settle(now) {
            LockoutState::Locked { until } => {
                let ms = (until - now).num_milliseconds();
                ((ms + 999) / 1000).max(0)
            }
            LockoutState::Unlocked { .. } => 0,
        }
    }

    pub fn record_failure(self, now: DateTime<Utc>, policy: &LockoutPolicy) -> Self {
        match self.settle(now) {
            locked @ LockoutState::Locked { .. } => locked,
            LockoutState::Unlocked { failures } => {
                let failures = failures + 1;
                if failures >= policy.max_attempts {
                    LockoutState::Locked {
                        until: now + policy.lockout,
                    }
                } else {
                    LockoutState::Unlocked { failures }
                }
            }
        }
    }

    /// State after a successful verification.
    pub fn reset(self) -> Self {
        LockoutState::default()
    }

    pub fn remaining_attempts(&self, now: DateTime<Utc>, policy: &LockoutPolicy) -> u32 {
        match self.settle(now) {
            LockoutState::Locked { .. } => 0,
            LockoutState::Unlocked { failures } => policy.max_attempts.saturating_sub(failures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn locks_on_fifth_failure() {
        let policy = LockoutPolicy::default();
        let mut state = LockoutState::default();
        for i in 1..5 {
            state = state.record_failure(t0(), &policy);
            assert_eq!(state, LockoutState::Unlocked { failures: i });
            assert_eq!(state.remaining_attempts(t0(), &policy), 5 - i);
        }
        state = state.record_failure(t0(), &policy);
        assert!(state.is_locked(t0()));
        assert_eq!(state.remaining_attempts(t0(), &policy), 0);
        assert_eq!(state.remaining_secs(t0()), 15 * 60);
    }

    #[test]
    fn failures_while_locked_keep_the_window() {
        let policy = LockoutPolicy::default();
        let until = t0() + Duration::minutes(15);
        let state = LockoutState::Locked { until };
        let later = t0() + Duration::minutes(10);
        assert_eq!(
            state.record_failure(later, &policy),
            LockoutState::Locked { until }
        );
        assert_eq!(state.remaining_secs(later), 5 * 60);
    }

    #[test]
    fn expired_lock_starts_a_fresh_count() {
        let policy = LockoutPolicy::default();
        let state = LockoutState::Locked {
            until: t0() + Duration::minutes(15),
        };
        let after = t0() + Duration::minutes(15) + Duration::seconds(1);
        assert!(!state.is_locked(after));
        assert_eq!(state.remaining_secs(after), 0);
        assert_eq!(
            state.record_failure(after, &policy),
            LockoutState::Unlocked { failures: 1 }
        );
    }

    #[test]
    fn remaining_secs_rounds_up() {
        let state = LockoutState::Locked {
            until: t0() + Duration::milliseconds(1500),
        };
        assert_eq!(state.remaining_secs(t0()), 2);
    }

    #[test]
    fn columns_round_trip() {
        let until = t0();
        assert_eq!(
            LockoutState::from_columns(3, None),
            LockoutState::Unlocked { failures: 3 }
        );
        assert_eq!(
            LockoutState::from_columns(0, Some(until)).to_columns(),
            (0, Some(until))
        );
        assert_eq!(
            LockoutState::from_columns(-2, None),
            LockoutState::Unlocked { failures: 0 }
        );
    }
}
