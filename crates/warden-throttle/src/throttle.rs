//! Store-backed attempt throttle.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warden_types::Identity;

use crate::config::ThrottleConfig;
use crate::error::{Result, StoreError, ThrottleError};
use crate::record::{
    AttemptRecord, Decision, Outcome, RecordResult, ThrottleState, apply_outcome, evaluate_record,
    state_of,
};
use crate::store::AttemptStore;

/// Applies the lockout state machine to records held in an [`AttemptStore`].
///
/// Every transition runs inside the store's atomic `update`, so concurrent
/// failures for one identity are all counted.
#[derive(Debug)]
pub struct AttemptThrottle<S> {
    store: S,
    config: ThrottleConfig,
}

impl<S: AttemptStore> AttemptThrottle<S> {
    pub fn new(store: S, config: ThrottleConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decides whether `identity` may attempt to log in at `now`.
    ///
    /// An expired lock is cleared as part of the same update.
    pub fn evaluate(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Decision> {
        let mut decision = None;
        self.store.update(identity, &mut |current| {
            let (next, d) = evaluate_record(current, now, &self.config);
            decision = Some(d);
            next
        })?;

        let decision = decision.ok_or_else(|| {
            ThrottleError::StoreUnavailable(StoreError::Unavailable(
                "store returned without applying the update".to_string(),
            ))
        })?;

        if let Decision::Denied {
            remaining_minutes, ..
        } = decision
        {
            debug!(identity = %identity, remaining_minutes, "Login attempt short-circuited by lockout");
        }
        Ok(decision)
    }

    /// Records the outcome of an authentication attempt.
    pub fn record(
        &self,
        identity: &Identity,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<RecordResult> {
        let mut result = None;
        self.store.update(identity, &mut |current| {
            let (next, r) = apply_outcome(identity, current, outcome, now, &self.config);
            result = Some(r);
            next
        })?;

        let result = result.ok_or_else(|| {
            ThrottleError::StoreUnavailable(StoreError::Unavailable(
                "store returned without applying the update".to_string(),
            ))
        })?;

        match result {
            RecordResult::Locked { lock_until } => warn!(
                identity = %identity,
                threshold = self.config.threshold,
                %lock_until,
                "Identity locked after repeated failed logins"
            ),
            RecordResult::Warned {
                fail_count,
                remaining_attempts,
            } => info!(
                identity = %identity,
                fail_count,
                remaining_attempts,
                "Failed login recorded"
            ),
            RecordResult::StillLocked { .. } | RecordResult::Cleared => {}
        }
        Ok(result)
    }

    /// Current state of `identity` without modifying the store.
    pub fn status(&self, identity: &Identity, now: DateTime<Utc>) -> Result<ThrottleState> {
        let record = self.store.load(identity)?;
        Ok(state_of(record.as_ref(), now))
    }

    /// Stored record for `identity`, if any.
    pub fn record_of(&self, identity: &Identity) -> Result<Option<AttemptRecord>> {
        Ok(self.store.load(identity)?)
    }

    /// Removes any record for `identity`. Returns whether one existed.
    pub fn clear(&self, identity: &Identity) -> Result<bool> {
        let existed = self.store.remove(identity)?;
        if existed {
            info!(identity = %identity, "Attempt record cleared");
        }
        Ok(existed)
    }
}
