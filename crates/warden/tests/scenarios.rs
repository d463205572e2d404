//! End-to-end scenarios across configuration, policy, and persistence.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use tempfile::TempDir;
use warden::{
    AuthFailure, Identity, IdentityProvider, LoginNotice, ManualClock, MemoryAttemptStore,
    MemoryResources, Principal, RawProfile, ResourceChanges, ResourceDraft, ResourceStatus,
    StaticProfiles, ViewScope, Warden, WardenConfig,
};

fn warden() -> Warden {
    Warden::from_config(&WardenConfig::default())
        .unwrap()
        .without_audit()
}

#[test]
fn security_manager_cannot_retype_to_vehicle() {
    let warden = warden();
    let resources = warden.resources(MemoryResources::new());
    let manager = Principal::manager("Segurança");

    let camera = resources
        .create(
            &manager,
            ResourceDraft {
                name: "Camera 4".to_string(),
                resource_type: Some("SecurityDevice".to_string()),
                status: ResourceStatus::Operational,
            },
        )
        .unwrap();
    let writes = resources.repository().write_count();

    let err = resources
        .update(
            &manager,
            &camera.id,
            ResourceChanges {
                resource_type: Some("Vehicle".to_string()),
                ..ResourceChanges::default()
            },
        )
        .unwrap_err();
    assert!(err.is_denied());
    assert_eq!(resources.repository().write_count(), writes, "rejected before persistence");

    let err = resources
        .create(
            &manager,
            ResourceDraft {
                name: "Patrol car".to_string(),
                resource_type: Some("Vehicle".to_string()),
                ..ResourceDraft::default()
            },
        )
        .unwrap_err();
    assert!(err.is_denied());
    assert_eq!(resources.repository().write_count(), writes);

    // The department's own types are accepted.
    let updated = resources
        .update(
            &manager,
            &camera.id,
            ResourceChanges {
                resource_type: Some("Equipment".to_string()),
                ..ResourceChanges::default()
            },
        )
        .unwrap();
    assert_eq!(updated.resource_type.as_str(), "Equipment");
}

#[test]
fn unmapped_department_sees_zero_rows() {
    let warden = warden();
    let resources = warden.resources(MemoryResources::new());
    let admin = Principal::admin();
    for resource_type in ["Equipment", "Vehicle", "Technology"] {
        resources
            .create(
                &admin,
                ResourceDraft {
                    name: format!("{resource_type} 1"),
                    resource_type: Some(resource_type.to_string()),
                    ..ResourceDraft::default()
                },
            )
            .unwrap();
    }

    let marketing = Principal::manager("Marketing");
    assert!(warden.engine().viewable_types(&marketing).is_empty());

    let scope = warden.engine().view_scope(&marketing);
    assert_eq!(scope, ViewScope::Nothing);
    assert_eq!(scope.to_where_clause("type").unwrap(), "FALSE");
    assert!(resources.list(&marketing).unwrap().is_empty());
    assert_eq!(resources.summary(&marketing).unwrap().total, 0);

    assert_eq!(resources.list(&admin).unwrap().len(), 3);
}

#[test]
fn department_lookup_ignores_whitespace() {
    let warden = warden();
    let padded = Principal::manager(" TI ");
    let exact = Principal::manager("TI");

    assert_eq!(
        warden.engine().manageable_types(&padded),
        warden.engine().manageable_types(&exact)
    );
    assert_eq!(
        warden.engine().viewable_types(&padded),
        warden.engine().viewable_types(&exact)
    );
}

struct OnePassword;

impl IdentityProvider for OnePassword {
    fn authenticate(&self, identity: &Identity, secret: &str) -> Result<(), AuthFailure> {
        match (identity.as_str(), secret) {
            ("carla@example.com", "hunter2") => Ok(()),
            ("carla@example.com", _) => Err(AuthFailure::WrongSecret),
            _ => Err(AuthFailure::UnknownIdentity),
        }
    }
}

#[test]
fn lockout_persists_across_gate_restarts() {
    let dir = TempDir::new().unwrap();
    let mut config = WardenConfig::default();
    config.resolve_paths(dir.path());
    let warden = Warden::from_config(&config).unwrap().without_audit();

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let profiles = || {
        StaticProfiles::new().with("carla@example.com", RawProfile::new("manager", "Segurança"))
    };
    let open_gate = |clock: Arc<ManualClock>| {
        let store = Arc::new(warden.file_store().unwrap());
        warden
            .login_gate(store, OnePassword, profiles())
            .with_clock(clock)
    };

    let clock = Arc::new(ManualClock::new(start));
    {
        let gate = open_gate(Arc::clone(&clock));
        for _ in 0..3 {
            gate.attempt("carla@example.com", "guess");
        }
    }

    // A fresh gate over the same file still refuses.
    clock.advance(TimeDelta::minutes(2));
    let gate = open_gate(Arc::clone(&clock));
    assert_eq!(
        gate.attempt("carla@example.com", "hunter2").notice,
        LoginNotice::Locked {
            remaining_minutes: 8
        }
    );

    clock.advance(TimeDelta::minutes(8));
    let outcome = gate.attempt("carla@example.com", "hunter2");
    assert_eq!(outcome.principal, Some(Principal::manager("Segurança")));
    assert!(warden.attempts_file().unwrap().exists());
}

#[test]
fn unknown_identity_failures_count_toward_lockout() {
    let warden = warden();
    let store = Arc::new(MemoryAttemptStore::new());
    let gate = warden.login_gate(store, OnePassword, StaticProfiles::new());

    for secret in ["x", "y"] {
        assert_eq!(
            gate.attempt("nobody@example.com", secret).failure,
            Some(AuthFailure::UnknownIdentity)
        );
    }

    assert_eq!(
        gate.attempt("nobody@example.com", "z").notice,
        LoginNotice::LockoutTriggered { lock_minutes: 10 }
    );
}
