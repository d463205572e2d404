//! # warden-throttle: Failed-login throttling
//!
//! Slows brute-force login by locking an identity out for a fixed time after
//! a fixed number of consecutive failures:
//! - **Attempt records** keyed by login identity
//! - **Pure transitions** ([`evaluate_record`], [`apply_outcome`])
//! - **Atomic stores** ([`MemoryAttemptStore`], [`FileAttemptStore`])
//! - **Login notices** with the wait rounded up to whole minutes
//!
//! Store failures are reported as [`ThrottleError::StoreUnavailable`], never
//! folded into an allowed/denied answer. The caller applies
//! [`StoreFailurePolicy`].
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use warden_throttle::{AttemptThrottle, Decision, MemoryAttemptStore, Outcome, ThrottleConfig};
//! use warden_types::Identity;
//!
//! let throttle = AttemptThrottle::new(MemoryAttemptStore::new(), ThrottleConfig::default());
//! let bob = Identity::new("bob@example.com");
//! let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
//!
//! for _ in 0..3 {
//!     throttle.record(&bob, Outcome::Failure, now)?;
//! }
//!
//! let decision = throttle.evaluate(&bob, now + TimeDelta::minutes(4))?;
//! assert!(matches!(decision, Decision::Denied { remaining_minutes: 6, .. }));
//! # Ok::<(), warden_throttle::ThrottleError>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod file_store;
pub mod notice;
pub mod record;
pub mod store;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_LOCK_DURATION, DEFAULT_THRESHOLD, StoreFailurePolicy, ThrottleConfig};
pub use error::{Result, StoreError, ThrottleError};
pub use file_store::FileAttemptStore;
pub use notice::LoginNotice;
pub use record::{
    AttemptRecord, Decision, Outcome, RecordResult, ThrottleState, apply_outcome, evaluate_record,
    remaining_minutes, state_of,
};
pub use store::{AttemptStore, MemoryAttemptStore, StoreResult};
pub use throttle::AttemptThrottle;
