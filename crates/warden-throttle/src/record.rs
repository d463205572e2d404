//! Attempt records and their state machine.
//!
//! ```text
//!            failure               failure (count = threshold)
//!   Clear ───────────▶ Warned ─────────────────────────────▶ Locked
//!     ▲                  │                                     │
//!     └──── success ─────┘◀──── success, or now ≥ lock_until ──┘
//! ```
//!
//! All transitions here are pure; persistence lives in [`crate::store`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use warden_types::Identity;

use crate::config::ThrottleConfig;

/// Failed-attempt history for one login identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub identity: Identity,

    /// Consecutive failures since the last success or lock expiry.
    pub fail_count: u32,

    /// End of the current lockout, if one was ever set and not yet cleared.
    pub lock_until: Option<DateTime<Utc>>,
}

/// Observable state of a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThrottleState {
    Clear,
    Warned { fail_count: u32 },
    Locked { lock_until: DateTime<Utc> },
}

impl AttemptRecord {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            fail_count: 0,
            lock_until: None,
        }
    }

    /// Returns whether the lock is in force at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| now < until)
    }

    /// Returns whether a lock was set and has run out by `now`.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| now >= until)
    }

    /// State of this record at `now`. An expired lock reads as `Clear`.
    pub fn state(&self, now: DateTime<Utc>) -> ThrottleState {
        match self.lock_until {
            Some(lock_until) if now < lock_until => ThrottleState::Locked { lock_until },
            Some(_) => ThrottleState::Clear,
            None if self.fail_count == 0 => ThrottleState::Clear,
            None => ThrottleState::Warned {
                fail_count: self.fail_count,
            },
        }
    }
}

/// State of an optional record; absence reads as `Clear`.
pub fn state_of(record: Option<&AttemptRecord>, now: DateTime<Utc>) -> ThrottleState {
    record.map_or(ThrottleState::Clear, |r| r.state(now))
}

/// Outcome reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// Answer to "may this identity attempt to log in now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// Proceed to the identity provider.
    Allowed { remaining_attempts: u32 },

    /// Locked out; do not contact the identity provider.
    Denied {
        lock_until: DateTime<Utc>,
        remaining_minutes: u64,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Result of recording an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordResult {
    /// Success: the record was cleared.
    Cleared,

    /// Failure below the threshold.
    Warned {
        fail_count: u32,
        remaining_attempts: u32,
    },

    /// Failure that reached the threshold and started a lockout.
    Locked { lock_until: DateTime<Utc> },

    /// Failure while already locked. Nothing changed.
    StillLocked { lock_until: DateTime<Utc> },
}

/// Whole minutes until `lock_until`, rounded up.
pub fn remaining_minutes(lock_until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let gap = lock_until - now;
    if gap <= TimeDelta::zero() {
        return 0;
    }
    // Any sub-second remainder counts as a started second.
    let seconds = gap.num_seconds() as u64 + u64::from(gap.subsec_nanos() > 0);
    seconds.div_ceil(60)
}

/// Evaluates a login attempt against a stored record.
///
/// Returns the record to store back and the decision. An expired lock is
/// cleared (the record is dropped) before answering.
pub fn evaluate_record(
    record: Option<AttemptRecord>,
    now: DateTime<Utc>,
    config: &ThrottleConfig,
) -> (Option<AttemptRecord>, Decision) {
    let record = record.filter(|r| !r.lock_expired(now));

    let decision = match &record {
        Some(r) if r.is_locked(now) => {
            // `is_locked` implies `lock_until` is set.
            let lock_until = r.lock_until.unwrap_or(now);
            Decision::Denied {
                lock_until,
                remaining_minutes: remaining_minutes(lock_until, now),
            }
        }
        Some(r) => Decision::Allowed {
            remaining_attempts: config.threshold.saturating_sub(r.fail_count),
        },
        None => Decision::Allowed {
            remaining_attempts: config.threshold,
        },
    };

    (record, decision)
}

/// Applies an authentication outcome to a stored record.
///
/// Returns the record to store back (`None` deletes it) and what happened.
pub fn apply_outcome(
    identity: &Identity,
    record: Option<AttemptRecord>,
    outcome: Outcome,
    now: DateTime<Utc>,
    config: &ThrottleConfig,
) -> (Option<AttemptRecord>, RecordResult) {
    if outcome == Outcome::Success {
        return (None, RecordResult::Cleared);
    }

    let active_lock = record
        .as_ref()
        .and_then(|r| r.lock_until)
        .filter(|until| now < *until);
    if let Some(lock_until) = active_lock {
        return (record, RecordResult::StillLocked { lock_until });
    }

    let mut next = record
        .filter(|r| !r.lock_expired(now))
        .unwrap_or_else(|| AttemptRecord::new(identity.clone()));
    next.fail_count = next.fail_count.saturating_add(1);

    let result = if next.fail_count >= config.threshold {
        let lock_until = config.lock_until(now);
        next.lock_until = Some(lock_until);
        RecordResult::Locked { lock_until }
    } else {
        RecordResult::Warned {
            fail_count: next.fail_count,
            remaining_attempts: config.threshold - next.fail_count,
        }
    };

    (Some(next), result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use test_case::test_case;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn bob() -> Identity {
        Identity::new("bob@example.com")
    }

    fn fail(
        record: Option<AttemptRecord>,
        now: DateTime<Utc>,
    ) -> (Option<AttemptRecord>, RecordResult) {
        apply_outcome(&bob(), record, Outcome::Failure, now, &ThrottleConfig::default())
    }

    #[test]
    fn test_two_failures_warn() {
        let (record, first) = fail(None, t0());
        assert_eq!(
            first,
            RecordResult::Warned {
                fail_count: 1,
                remaining_attempts: 2
            }
        );

        let (record, second) = fail(record, t0());
        assert_eq!(
            second,
            RecordResult::Warned {
                fail_count: 2,
                remaining_attempts: 1
            }
        );

        let (_, decision) = evaluate_record(record, t0(), &ThrottleConfig::default());
        assert_eq!(
            decision,
            Decision::Allowed {
                remaining_attempts: 1
            }
        );
    }

    #[test]
    fn test_third_failure_locks() {
        let (record, _) = fail(None, t0());
        let (record, _) = fail(record, t0());
        let (record, third) = fail(record, t0());

        let expected = t0() + TimeDelta::minutes(10);
        assert_eq!(third, RecordResult::Locked { lock_until: expected });
        assert_eq!(record.as_ref().unwrap().lock_until, Some(expected));
        assert_eq!(
            state_of(record.as_ref(), t0()),
            ThrottleState::Locked { lock_until: expected }
        );
    }

    #[test]
    fn test_failure_while_locked_changes_nothing() {
        let locked = AttemptRecord {
            identity: bob(),
            fail_count: 3,
            lock_until: Some(t0() + TimeDelta::minutes(10)),
        };

        let later = t0() + TimeDelta::minutes(4);
        let (record, result) = fail(Some(locked.clone()), later);
        assert_eq!(record, Some(locked.clone()));
        assert_eq!(
            result,
            RecordResult::StillLocked {
                lock_until: t0() + TimeDelta::minutes(10)
            }
        );

        let (record, decision) =
            evaluate_record(Some(locked.clone()), later, &ThrottleConfig::default());
        assert_eq!(record, Some(locked));
        assert_eq!(
            decision,
            Decision::Denied {
                lock_until: t0() + TimeDelta::minutes(10),
                remaining_minutes: 6
            }
        );
    }

    #[test]
    fn test_expired_lock_resets_before_evaluation() {
        let locked = AttemptRecord {
            identity: bob(),
            fail_count: 3,
            lock_until: Some(t0() + TimeDelta::minutes(10)),
        };

        let (record, decision) = evaluate_record(
            Some(locked),
            t0() + TimeDelta::minutes(10),
            &ThrottleConfig::default(),
        );
        assert!(record.is_none());
        assert_eq!(
            decision,
            Decision::Allowed {
                remaining_attempts: 3
            }
        );
    }

    #[test]
    fn test_failure_after_expiry_starts_over() {
        let locked = AttemptRecord {
            identity: bob(),
            fail_count: 3,
            lock_until: Some(t0() + TimeDelta::minutes(10)),
        };

        let (record, result) = fail(Some(locked), t0() + TimeDelta::minutes(11));
        assert_eq!(
            result,
            RecordResult::Warned {
                fail_count: 1,
                remaining_attempts: 2
            }
        );
        assert_eq!(record.unwrap().lock_until, None);
    }

    #[test]
    fn test_success_clears_from_any_state() {
        let config = ThrottleConfig::default();
        let warned = AttemptRecord {
            identity: bob(),
            fail_count: 2,
            lock_until: None,
        };
        let expired = AttemptRecord {
            identity: bob(),
            fail_count: 3,
            lock_until: Some(t0() - TimeDelta::minutes(1)),
        };

        for record in [None, Some(warned), Some(expired)] {
            let (next, result) = apply_outcome(&bob(), record, Outcome::Success, t0(), &config);
            assert!(next.is_none());
            assert_eq!(result, RecordResult::Cleared);
        }
    }

    #[test_case(500, 1; "half a millisecond")]
    #[test_case(1_000, 1; "one millisecond")]
    #[test_case(60_000_000, 1; "exactly one minute")]
    #[test_case(60_000_001, 2; "just over one minute")]
    #[test_case(600_000_000, 10; "ten minutes")]
    #[test_case(0, 0; "already over")]
    #[test_case(-5_000_000, 0; "in the past")]
    fn test_remaining_minutes_rounds_up(micros: i64, expected: u64) {
        let lock_until = t0() + TimeDelta::microseconds(micros);
        assert_eq!(remaining_minutes(lock_until, t0()), expected);
    }

    #[test]
    fn test_lock_about_to_expire_still_reports_a_minute() {
        let lock_until = t0() + TimeDelta::microseconds(500);
        let locked = AttemptRecord {
            identity: bob(),
            fail_count: 3,
            lock_until: Some(lock_until),
        };

        let (_, decision) = evaluate_record(Some(locked), t0(), &ThrottleConfig::default());
        assert_eq!(
            decision,
            Decision::Denied {
                lock_until,
                remaining_minutes: 1
            }
        );
    }

    #[test]
    fn test_state_of_absent_record() {
        assert_eq!(state_of(None, t0()), ThrottleState::Clear);
    }

    proptest! {
        /// Property: an identity is locked exactly after `threshold` consecutive failures.
        #[test]
        fn prop_lock_after_threshold(threshold in 1u32..8, minutes in 1u64..120) {
            let config = ThrottleConfig::new(threshold, std::time::Duration::from_secs(minutes * 60));
            let mut record = None;
            for i in 1..=threshold {
                let (next, result) = apply_outcome(&bob(), record, Outcome::Failure, t0(), &config);
                record = next;
                if i < threshold {
                    prop_assert_eq!(
                        result,
                        RecordResult::Warned { fail_count: i, remaining_attempts: threshold - i }
                    );
                } else {
                    prop_assert_eq!(result, RecordResult::Locked { lock_until: config.lock_until(t0()) });
                }
            }
            let (_, decision) = evaluate_record(record, t0(), &config);
            prop_assert_eq!(
                decision,
                Decision::Denied { lock_until: config.lock_until(t0()), remaining_minutes: minutes }
            );
        }

        /// Property: failures inside the lock window never move the lock or the count.
        #[test]
        fn prop_locked_record_is_frozen(offset_secs in 0i64..600) {
            let config = ThrottleConfig::default();
            let locked = AttemptRecord {
                identity: bob(),
                fail_count: 3,
                lock_until: Some(t0() + TimeDelta::minutes(10)),
            };
            let now = t0() + TimeDelta::seconds(offset_secs);
            let (next, _) = apply_outcome(&bob(), Some(locked.clone()), Outcome::Failure, now, &config);
            prop_assert_eq!(next, Some(locked));
        }
    }
}
