//! Login gate: throttle, identity provider, profile.
//!
//! ```text
//! evaluate ──Denied──▶ Locked notice (provider never called)
//!    │
//!  Allowed
//!    ▼
//! authenticate ──▶ record outcome ──▶ notice (+ principal on success)
//! ```

use std::fmt::{self, Display};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use warden_throttle::{
    AttemptStore, AttemptThrottle, Clock, Decision, LoginNotice, Outcome, RecordResult,
    StoreFailurePolicy, SystemClock, ThrottleConfig, ThrottleError,
};
use warden_types::{Identity, Principal};

use crate::resolver::{ProfileResolver, SafeResolver};

/// Why the identity provider rejected an attempt.
///
/// Every kind counts toward the lockout threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuthFailure {
    UnknownIdentity,
    InvalidIdentity,
    WrongSecret,
    ProviderThrottled,
    Other(String),
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::UnknownIdentity => f.write_str("unknown identity"),
            AuthFailure::InvalidIdentity => f.write_str("invalid identity"),
            AuthFailure::WrongSecret => f.write_str("wrong secret"),
            AuthFailure::ProviderThrottled => f.write_str("throttled by provider"),
            AuthFailure::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Checks credentials.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, identity: &Identity, secret: &str) -> Result<(), AuthFailure>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn authenticate(&self, identity: &Identity, secret: &str) -> Result<(), AuthFailure> {
        (**self).authenticate(identity, secret)
    }
}

/// Result of one pass through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub identity: Identity,

    /// Set only when the provider accepted the credentials and the gate let
    /// the session through.
    pub principal: Option<Principal>,

    /// What to tell the user.
    pub notice: LoginNotice,

    /// Provider rejection, when the provider was consulted and said no.
    pub failure: Option<AuthFailure>,
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    fn rejected(identity: Identity, notice: LoginNotice, failure: Option<AuthFailure>) -> Self {
        Self {
            identity,
            principal: None,
            notice,
            failure,
        }
    }
}

/// Runs login attempts through the throttle.
pub struct LoginGate<P, R> {
    throttle: AttemptThrottle<Arc<dyn AttemptStore>>,
    provider: P,
    resolver: SafeResolver<R>,
    clock: Arc<dyn Clock>,
}

impl<P: IdentityProvider, R: ProfileResolver> LoginGate<P, R> {
    pub fn new(
        config: ThrottleConfig,
        store: Arc<dyn AttemptStore>,
        provider: P,
        resolver: R,
    ) -> Self {
        Self {
            throttle: AttemptThrottle::new(store, config),
            provider,
            resolver: SafeResolver::new(resolver),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn throttle(&self) -> &AttemptThrottle<Arc<dyn AttemptStore>> {
        &self.throttle
    }

    /// Attempts a login.
    ///
    /// A locked identity is rejected without contacting the provider. When
    /// the attempt store fails, the configured [`StoreFailurePolicy`] decides:
    /// fail-closed rejects the attempt, fail-open lets the provider decide
    /// and logs a warning.
    pub fn attempt(&self, identity: &str, secret: &str) -> LoginOutcome {
        let identity = Identity::new(identity);
        let policy = self.throttle.config().on_store_failure;

        match self.throttle.evaluate(&identity, self.clock.now()) {
            Ok(decision @ Decision::Denied { .. }) => {
                let notice = LoginNotice::for_decision(&decision)
                    .unwrap_or(LoginNotice::ServiceUnavailable);
                info!(identity = %identity, "Login rejected: identity locked");
                return LoginOutcome::rejected(identity, notice, None);
            }
            Ok(Decision::Allowed { .. }) => {}
            Err(e) => {
                if let Some(outcome) = self.store_failed(&identity, policy, &e) {
                    return outcome;
                }
            }
        }

        let result = self.provider.authenticate(&identity, secret);
        let outcome = if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        };

        let recorded = match self.throttle.record(&identity, outcome, self.clock.now()) {
            Ok(recorded) => Some(recorded),
            Err(e) => {
                if let Some(outcome) = self.store_failed(&identity, policy, &e) {
                    return outcome;
                }
                None
            }
        };

        match result {
            Ok(()) => {
                let principal = self.resolver.resolve(&identity);
                info!(identity = %identity, principal = %principal, "Login succeeded");
                LoginOutcome {
                    identity,
                    principal: Some(principal),
                    notice: LoginNotice::Welcome,
                    failure: None,
                }
            }
            Err(failure) => {
                let notice = self.failure_notice(recorded.as_ref(), &failure);
                info!(identity = %identity, reason = %failure, "Login failed");
                LoginOutcome::rejected(identity, notice, Some(failure))
            }
        }
    }

    /// Applies the store-failure policy. `Some` ends the attempt.
    fn store_failed(
        &self,
        identity: &Identity,
        policy: StoreFailurePolicy,
        e: &ThrottleError,
    ) -> Option<LoginOutcome> {
        match policy {
            StoreFailurePolicy::FailClosed => {
                error!(identity = %identity, error = %e, "Attempt store failed, rejecting login");
                Some(LoginOutcome::rejected(
                    identity.clone(),
                    LoginNotice::ServiceUnavailable,
                    None,
                ))
            }
            StoreFailurePolicy::FailOpen => {
                warn!(identity = %identity, error = %e, "Attempt store failed, login not throttled");
                None
            }
        }
    }

    fn failure_notice(&self, recorded: Option<&RecordResult>, failure: &AuthFailure) -> LoginNotice {
        let lock_minutes = self.throttle.config().lock_minutes();
        match (recorded, failure) {
            (None, _) => LoginNotice::InvalidCredentials,
            (Some(RecordResult::Warned { .. }), AuthFailure::ProviderThrottled) => {
                LoginNotice::ProviderThrottled
            }
            (Some(recorded), failure) => LoginNotice::for_record(
                recorded,
                lock_minutes,
                matches!(
                    failure,
                    AuthFailure::UnknownIdentity | AuthFailure::InvalidIdentity
                ),
            ),
        }
    }
}
