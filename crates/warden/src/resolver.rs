//! Profile resolution.
//!
//! The backend that stores user profiles is untrusted: it may be missing a
//! profile, hold a malformed one, or fail outright. [`SafeResolver`] turns all
//! of these into the least-privileged principal.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};
use warden_types::{Identity, Principal, RawProfile, Role};

/// Failure of a profile backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("profile backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed profile: {0}")]
    Malformed(String),
}

/// Source of user profiles.
pub trait ProfileResolver: Send + Sync {
    /// Looks up the profile for `identity`. `Ok(None)` means not found.
    fn resolve(&self, identity: &Identity) -> Result<Option<RawProfile>, ResolveError>;
}

impl<T: ProfileResolver + ?Sized> ProfileResolver for Arc<T> {
    fn resolve(&self, identity: &Identity) -> Result<Option<RawProfile>, ResolveError> {
        (**self).resolve(identity)
    }
}

/// Resolver wrapper that never fails and never escalates.
#[derive(Debug, Clone)]
pub struct SafeResolver<R> {
    inner: R,
}

impl<R: ProfileResolver> SafeResolver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Resolves `identity` to a principal.
    ///
    /// Not-found, backend errors, and unrecognized roles all yield
    /// [`Principal::safe_default`].
    pub fn resolve(&self, identity: &Identity) -> Principal {
        match self.inner.resolve(identity) {
            Ok(Some(raw)) => {
                if let Some(role) = unrecognized_role(&raw) {
                    warn!(
                        identity = %identity,
                        role,
                        "Unrecognized role in profile, using least privilege"
                    );
                }
                Principal::from_raw(&raw)
            }
            Ok(None) => {
                warn!(identity = %identity, "No profile found, using least privilege");
                Principal::safe_default()
            }
            Err(e) => {
                error!(identity = %identity, error = %e, "Profile lookup failed, using least privilege");
                Principal::safe_default()
            }
        }
    }
}

/// The profile's role when it is present but not one of the known roles.
fn unrecognized_role(raw: &RawProfile) -> Option<&str> {
    raw.role.as_deref().filter(|role| Role::parse(role).is_none())
}

/// In-memory profile table.
#[derive(Debug, Clone, Default)]
pub struct StaticProfiles {
    profiles: HashMap<Identity, RawProfile>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn with(mut self, identity: &str, profile: RawProfile) -> Self {
        self.insert(identity, profile);
        self
    }

    pub fn insert(&mut self, identity: &str, profile: RawProfile) {
        self.profiles.insert(Identity::new(identity), profile);
    }
}

impl ProfileResolver for StaticProfiles {
    fn resolve(&self, identity: &Identity) -> Result<Option<RawProfile>, ResolveError> {
        Ok(self.profiles.get(identity).cloned())
    }
}
