//! The Warden handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use warden_config::WardenConfig;
use warden_rbac::{AccessPolicyEngine, ManagementGuard};
use warden_throttle::{AttemptStore, AttemptThrottle, FileAttemptStore, ThrottleConfig};

use crate::error::Result;
use crate::login::{IdentityProvider, LoginGate};
use crate::resolver::ProfileResolver;
use crate::resources::{ResourceRepository, ResourceService};

/// Policy engine, guard and throttle settings built from one configuration.
///
/// Cheap to clone; the policy tables are shared.
///
/// # Example
///
/// ```
/// use warden::{Warden, WardenConfig};
/// use warden_types::Principal;
///
/// let warden = Warden::from_config(&WardenConfig::default())?;
/// let manager = Principal::manager(" TI ");
/// assert_eq!(warden.engine().manageable_types(&manager).len(), 1);
/// # Ok::<(), warden::WardenError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Warden {
    guard: ManagementGuard,
    throttle: ThrottleConfig,
    attempts_file: Option<PathBuf>,
}

impl Warden {
    /// Builds from a validated or unvalidated configuration.
    pub fn from_config(config: &WardenConfig) -> Result<Self> {
        config.validate()?;
        let (catalog, departments) = config.policy_tables()?;

        Ok(Self {
            guard: ManagementGuard::new(AccessPolicyEngine::new(catalog, departments)),
            throttle: config.throttle_config(),
            attempts_file: Some(config.store.attempts_file.clone()),
        })
    }

    /// Builds from explicit parts, without a durable attempt store.
    pub fn new(engine: AccessPolicyEngine, throttle: ThrottleConfig) -> Self {
        Self {
            guard: ManagementGuard::new(engine),
            throttle,
            attempts_file: None,
        }
    }

    /// Disables policy audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.guard = self.guard.without_audit();
        self
    }

    pub fn engine(&self) -> &AccessPolicyEngine {
        self.guard.engine()
    }

    pub fn guard(&self) -> &ManagementGuard {
        &self.guard
    }

    pub fn throttle_config(&self) -> &ThrottleConfig {
        &self.throttle
    }

    /// Path of the configured durable attempt store, if any.
    pub fn attempts_file(&self) -> Option<&Path> {
        self.attempts_file.as_deref()
    }

    /// Opens the configured durable attempt store.
    pub fn file_store(&self) -> Option<FileAttemptStore> {
        self.attempts_file.as_ref().map(FileAttemptStore::new)
    }

    /// A throttle over `store` with the configured parameters.
    pub fn throttle<S: AttemptStore>(&self, store: S) -> AttemptThrottle<S> {
        AttemptThrottle::new(store, self.throttle)
    }

    /// A resource service over `repository`, guarded by this policy.
    pub fn resources<R: ResourceRepository>(&self, repository: R) -> ResourceService<R> {
        ResourceService::new(self.guard.clone(), repository)
    }

    /// A login gate over `store` with the configured throttle parameters.
    pub fn login_gate<P, R>(
        &self,
        store: Arc<dyn AttemptStore>,
        provider: P,
        resolver: R,
    ) -> LoginGate<P, R>
    where
        P: IdentityProvider,
        R: ProfileResolver,
    {
        LoginGate::new(self.throttle, store, provider, resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_config::DepartmentConfig;
    use warden_throttle::StoreFailurePolicy;
    use warden_types::Principal;

    #[test]
    fn test_from_default_config() {
        let warden = Warden::from_config(&WardenConfig::default()).unwrap();
        assert_eq!(warden.engine().catalog().len(), 5);
        assert_eq!(warden.throttle_config().threshold, 3);
        assert_eq!(
            warden.throttle_config().on_store_failure,
            StoreFailurePolicy::FailClosed
        );
        assert!(warden.attempts_file().is_some());
    }

    #[test]
    fn test_custom_departments_replace_standard_ones() {
        let mut config = WardenConfig::default();
        config.departments = vec![DepartmentConfig {
            name: "Frota".to_string(),
            types: vec!["Vehicle".to_string()],
        }];
        let warden = Warden::from_config(&config).unwrap();

        assert_eq!(warden.engine().manageable_types(&Principal::manager("frota")).len(), 1);
        assert!(
            warden
                .engine()
                .manageable_types(&Principal::manager("Transporte"))
                .is_empty()
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = WardenConfig::default();
        config.catalog.clear();
        let err = Warden::from_config(&config).unwrap_err();
        assert!(matches!(err, crate::WardenError::Config(_)));
    }
}
