//! Permission inspection.

use std::collections::BTreeSet;

use anyhow::Result;
use warden::{Action, Principal, RawProfile, ResourceType, Role, ViewScope};

use super::ConfigSource;
use crate::style::{self, colors::SemanticStyle};

fn join(types: &BTreeSet<ResourceType>) -> String {
    if types.is_empty() {
        "(none)".to_string()
    } else {
        types
            .iter()
            .map(ResourceType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn run(
    source: &ConfigSource,
    role: &str,
    department: Option<&str>,
    resource_type: Option<&str>,
    column: &str,
) -> Result<()> {
    let warden = source.warden()?;
    let engine = warden.engine();

    // Same path as a profile coming from the backend.
    let principal = Principal::from_raw(&RawProfile {
        role: Some(role.to_string()),
        department: department.map(str::to_string),
    });
    if Role::parse(role).is_none() {
        style::print_warn(&format!(
            "Unknown role '{role}', evaluating as the least-privileged principal"
        ));
    }

    let scope = engine.view_scope(&principal);
    let filter = match &scope {
        ViewScope::Unrestricted => "(no filter)".to_string(),
        scope => scope.to_where_clause(column)?,
    };

    let mut entries = vec![
        ("Principal", principal.to_string()),
        ("Manageable types", join(&engine.manageable_types(&principal))),
        ("Viewable types", join(&engine.viewable_types(&principal))),
        ("View filter", filter),
    ];

    let selectable = warden.guard().selectable_types(&principal);
    if let Ok(primary) = engine.creation_type(&principal, None) {
        entries.push(("Creates as", primary.to_string()));
    } else if !selectable.is_empty() {
        entries.push(("Creates as", "(choose from catalog)".to_string()));
    }

    if let Some(label) = resource_type {
        let allowed = engine.can_manage(&principal, label, Action::Update);
        let verdict = if allowed {
            "yes".success()
        } else if engine.catalog().resolve(label).is_none() {
            format!("no ('{label}' is not in the catalog)").error()
        } else {
            "no".error()
        };
        entries.push(("Can manage", format!("{} → {verdict}", label.trim())));
    }

    style::print_info_table(&entries);
    Ok(())
}
