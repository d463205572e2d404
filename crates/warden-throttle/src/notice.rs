//! User-facing login messages.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::record::{Decision, RecordResult};

/// Message shown to the person at the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoginNotice {
    Welcome,

    /// The identity is locked; no credentials were checked.
    Locked { remaining_minutes: u64 },

    /// This failure started a lockout.
    LockoutTriggered { lock_minutes: u64 },

    /// Wrong credentials, more tries left.
    AttemptsRemaining { remaining: u32 },

    /// The identity provider does not know this login.
    IdentityNotFound { remaining: u32 },

    /// Wrong credentials, with no count available (the attempt store was
    /// bypassed).
    InvalidCredentials,

    /// The identity provider itself is rate-limiting this login.
    ProviderThrottled,

    /// The attempt store could not be reached and the gate failed closed.
    ServiceUnavailable,
}

impl LoginNotice {
    /// Notice for a denied pre-check. `None` when the attempt may proceed.
    pub fn for_decision(decision: &Decision) -> Option<Self> {
        match decision {
            Decision::Allowed { .. } => None,
            Decision::Denied {
                remaining_minutes, ..
            } => Some(LoginNotice::Locked {
                remaining_minutes: *remaining_minutes,
            }),
        }
    }

    /// Notice for a recorded outcome.
    ///
    /// `unknown_identity` selects the not-found wording for failures below the
    /// threshold; the count is the same either way.
    pub fn for_record(result: &RecordResult, lock_minutes: u64, unknown_identity: bool) -> Self {
        match *result {
            RecordResult::Cleared => LoginNotice::Welcome,
            RecordResult::Warned {
                remaining_attempts, ..
            } if unknown_identity => LoginNotice::IdentityNotFound {
                remaining: remaining_attempts,
            },
            RecordResult::Warned {
                remaining_attempts, ..
            } => LoginNotice::AttemptsRemaining {
                remaining: remaining_attempts,
            },
            RecordResult::Locked { .. } | RecordResult::StillLocked { .. } => {
                LoginNotice::LockoutTriggered { lock_minutes }
            }
        }
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl Display for LoginNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginNotice::Welcome => f.write_str("Access granted. Welcome!"),
            LoginNotice::Locked { remaining_minutes } => write!(
                f,
                "Too many login attempts. Your account is locked. Try again in {remaining_minutes} minute{}.",
                plural(*remaining_minutes)
            ),
            LoginNotice::LockoutTriggered { lock_minutes } => write!(
                f,
                "Incorrect credentials. You have exceeded the number of attempts. The account is locked for {lock_minutes} minute{}.",
                plural(*lock_minutes)
            ),
            LoginNotice::AttemptsRemaining { remaining } => write!(
                f,
                "Incorrect credentials. You have {remaining} more attempt{}.",
                plural(u64::from(*remaining))
            ),
            LoginNotice::IdentityNotFound { remaining } => write!(
                f,
                "Email not found. Check the address you entered. You have {remaining} more attempt{}.",
                plural(u64::from(*remaining))
            ),
            LoginNotice::InvalidCredentials => {
                f.write_str("Incorrect email or password. Try again!")
            }
            LoginNotice::ProviderThrottled => {
                f.write_str("Access temporarily blocked by the identity provider. Try again later.")
            }
            LoginNotice::ServiceUnavailable => {
                f.write_str("Login is temporarily unavailable. Try again later.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    #[test_case(LoginNotice::Locked { remaining_minutes: 7 }, "Try again in 7 minutes."; "locked plural")]
    #[test_case(LoginNotice::Locked { remaining_minutes: 1 }, "Try again in 1 minute."; "locked singular")]
    #[test_case(LoginNotice::AttemptsRemaining { remaining: 1 }, "You have 1 more attempt."; "one left")]
    #[test_case(LoginNotice::AttemptsRemaining { remaining: 2 }, "You have 2 more attempts."; "two left")]
    #[test_case(LoginNotice::LockoutTriggered { lock_minutes: 10 }, "locked for 10 minutes."; "lockout")]
    fn test_messages(notice: LoginNotice, fragment: &str) {
        let text = notice.to_string();
        assert!(text.contains(fragment), "{text:?} lacks {fragment:?}");
    }

    #[test]
    fn test_denied_decision_maps_to_locked() {
        let decision = Decision::Denied {
            lock_until: Utc.with_ymd_and_hms(2026, 3, 1, 9, 10, 0).unwrap(),
            remaining_minutes: 4,
        };
        assert_eq!(
            LoginNotice::for_decision(&decision),
            Some(LoginNotice::Locked {
                remaining_minutes: 4
            })
        );
        assert_eq!(
            LoginNotice::for_decision(&Decision::Allowed {
                remaining_attempts: 3
            }),
            None
        );
    }

    #[test]
    fn test_unknown_identity_wording_keeps_count() {
        let result = RecordResult::Warned {
            fail_count: 1,
            remaining_attempts: 2,
        };
        assert_eq!(
            LoginNotice::for_record(&result, 10, true),
            LoginNotice::IdentityNotFound { remaining: 2 }
        );
        assert_eq!(
            LoginNotice::for_record(&result, 10, false),
            LoginNotice::AttemptsRemaining { remaining: 2 }
        );
        assert_eq!(
            LoginNotice::for_record(&RecordResult::Cleared, 10, false),
            LoginNotice::Welcome
        );
    }
}
