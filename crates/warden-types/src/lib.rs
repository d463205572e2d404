//! # warden-types: Core types for `Warden`
//!
//! This crate contains the vocabulary shared across the `Warden` system:
//! - Requesters ([`Principal`], [`Role`], [`Department`])
//! - Untrusted resolver output ([`RawProfile`])
//! - Catalog labels ([`ResourceType`])
//! - Management actions ([`Action`])
//! - Login identities ([`Identity`])

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Role
// ============================================================================

/// Role of an authenticated requester.
///
/// Roles are ordered from least to most privileged:
/// Employee < Manager < Admin
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees the resource types mapped to their department. Cannot mutate.
    #[default]
    Employee,

    /// Sees and manages the resource types mapped to their department.
    Manager,

    /// Sees and manages the whole catalog regardless of department.
    Admin,
}

impl Role {
    /// Parses a role from free-form text.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything that is not one of the three roles.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::Role;
    ///
    /// assert_eq!(Role::parse(" Manager "), Some(Role::Manager));
    /// assert_eq!(Role::parse("root"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    /// Returns the lowercase wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Returns whether this role bypasses department scoping.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Returns whether this role may mutate resources at all.
    ///
    /// Managers are further limited to their department's types.
    pub fn may_mutate(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Department
// ============================================================================

/// Legacy sentinel some profile documents carry instead of an absent department.
const NO_DEPARTMENT_SENTINEL: &str = "none";

/// Normalizes a department name into its lookup key.
///
/// Department values arrive as free-form text, so keys are trimmed and
/// lowercased before any comparison.
///
/// # Examples
///
/// ```
/// use warden_types::normalize_department;
///
/// assert_eq!(normalize_department(" TI "), "ti");
/// assert_eq!(normalize_department("Segurança"), "segurança");
/// ```
pub fn normalize_department(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Organizational department of a principal.
///
/// Keeps the trimmed spelling for display and a normalized key for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Department {
    name: String,
    key: String,
}

impl Department {
    /// Parses a department from free-form text.
    ///
    /// Returns `None` for empty or whitespace-only input and for the legacy
    /// `"none"` sentinel.
    pub fn parse(raw: &str) -> Option<Department> {
        let name = raw.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(NO_DEPARTMENT_SENTINEL) {
            return None;
        }
        Some(Department {
            name: name.to_string(),
            key: normalize_department(name),
        })
    }

    /// Returns the trimmed display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<Department> for String {
    fn from(department: Department) -> Self {
        department.name
    }
}

impl TryFrom<String> for Department {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Department::parse(&value).ok_or_else(|| format!("invalid department: {value:?}"))
    }
}

// ============================================================================
// Principal
// ============================================================================

/// Profile document as returned by the profile store.
///
/// Every field is optional and unvalidated; convert with
/// [`Principal::from_raw`] before making any decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl RawProfile {
    pub fn new(role: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            department: Some(department.into()),
        }
    }
}

/// The authenticated actor's role and department.
///
/// Resolved once per session and immutable afterwards. The default value is
/// the least-privileged principal: `Employee` without a department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    role: Role,
    department: Option<Department>,
}

impl Principal {
    /// Creates a principal from a role and an optional free-form department.
    pub fn new(role: Role, department: Option<&str>) -> Self {
        Self {
            role,
            department: department.and_then(Department::parse),
        }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin, None)
    }

    pub fn manager(department: &str) -> Self {
        Self::new(Role::Manager, Some(department))
    }

    pub fn employee(department: &str) -> Self {
        Self::new(Role::Employee, Some(department))
    }

    /// The least-privileged principal: `Employee` with no department.
    pub fn safe_default() -> Self {
        Self::default()
    }

    /// Converts an untrusted profile into a principal.
    ///
    /// A missing or unrecognized role yields [`Principal::safe_default`],
    /// discarding the department as well. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::{Principal, RawProfile, Role};
    ///
    /// let p = Principal::from_raw(&RawProfile::new("manager", " TI "));
    /// assert_eq!(p.role(), Role::Manager);
    /// assert_eq!(p.department().map(|d| d.name()), Some("TI"));
    ///
    /// let unknown = Principal::from_raw(&RawProfile::new("superuser", "TI"));
    /// assert_eq!(unknown, Principal::safe_default());
    /// ```
    pub fn from_raw(raw: &RawProfile) -> Self {
        match raw.role.as_deref().and_then(Role::parse) {
            Some(role) => Self::new(role, raw.department.as_deref()),
            None => Self::safe_default(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn department(&self) -> Option<&Department> {
        self.department.as_ref()
    }

    /// Normalized department key, if any.
    pub fn department_key(&self) -> Option<&str> {
        self.department.as_ref().map(Department::key)
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.department {
            Some(department) => write!(f, "{}@{}", self.role, department),
            None => write!(f, "{}", self.role),
        }
    }
}

// ============================================================================
// Resource types and actions
// ============================================================================

/// Label classifying a managed record (e.g. `Vehicle`, `Technology`).
///
/// A `ResourceType` is only meaningful relative to a catalog; labels not in
/// the catalog carry no permission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Creates a label, trimming surrounding whitespace.
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Mutating action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Create, Action::Update, Action::Delete];
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Login identity (typically an email address) used to key attempt records.
///
/// Identities are trimmed and lowercased so that case variants of the same
/// login share one attempt record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("admin", Some(Role::Admin); "admin")]
    #[test_case("MANAGER", Some(Role::Manager); "uppercase manager")]
    #[test_case("  employee\t", Some(Role::Employee); "padded employee")]
    #[test_case("gerente", None; "unknown word")]
    #[test_case("", None; "empty")]
    fn test_role_parse(raw: &str, expected: Option<Role>) {
        assert_eq!(Role::parse(raw), expected);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Employee < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Admin.is_unrestricted());
        assert!(!Role::Manager.is_unrestricted());
        assert!(Role::Manager.may_mutate());
        assert!(!Role::Employee.may_mutate());
    }

    #[test_case("", None; "empty")]
    #[test_case("   ", None; "whitespace")]
    #[test_case("none", None; "sentinel")]
    #[test_case("None", None; "sentinel capitalized")]
    #[test_case(" TI ", Some("TI"); "trimmed")]
    fn test_department_parse(raw: &str, expected: Option<&str>) {
        assert_eq!(Department::parse(raw).as_ref().map(Department::name), expected);
    }

    #[test]
    fn test_department_key_is_normalized() {
        let a = Department::parse(" TI ").unwrap();
        let b = Department::parse("ti").unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.name(), "TI");
    }

    #[test]
    fn test_principal_from_raw_missing_role() {
        let raw = RawProfile {
            role: None,
            department: Some("TI".to_string()),
        };
        assert_eq!(Principal::from_raw(&raw), Principal::safe_default());
    }

    #[test]
    fn test_principal_from_raw_unknown_role_drops_department() {
        let principal = Principal::from_raw(&RawProfile::new("owner", "TI"));
        assert_eq!(principal.role(), Role::Employee);
        assert!(principal.department().is_none());
    }

    #[test]
    fn test_principal_from_raw_legacy_default() {
        let principal = Principal::from_raw(&RawProfile::new("employee", "none"));
        assert_eq!(principal, Principal::safe_default());
    }

    #[test]
    fn test_raw_profile_deserializes_partial_documents() {
        let raw: RawProfile = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(raw.role.as_deref(), Some("admin"));
        assert!(raw.department.is_none());

        let empty: RawProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(Principal::from_raw(&empty), Principal::safe_default());
    }

    #[test]
    fn test_principal_display() {
        assert_eq!(Principal::manager(" TI ").to_string(), "manager@TI");
        assert_eq!(Principal::admin().to_string(), "admin");
    }

    #[test]
    fn test_identity_normalization() {
        assert_eq!(Identity::new(" Bob@Example.com "), Identity::new("bob@example.com"));
    }

    proptest! {
        /// Property: any role string outside the three known roles degrades to the safe default.
        #[test]
        fn prop_unknown_role_is_safe_default(role in "[a-z]{1,12}", dept in ".{0,16}") {
            prop_assume!(Role::parse(&role).is_none());
            let principal = Principal::from_raw(&RawProfile::new(role, dept));
            prop_assert_eq!(principal, Principal::safe_default());
        }

        /// Property: surrounding whitespace never changes the department key.
        #[test]
        fn prop_department_key_ignores_padding(
            name in "[A-Za-z]{1,10}",
            left in " {0,3}",
            right in " {0,3}",
        ) {
            prop_assume!(!name.eq_ignore_ascii_case("none"));
            let padded = format!("{left}{name}{right}");
            let a = Department::parse(&padded).unwrap();
            let b = Department::parse(&name).unwrap();
            prop_assert_eq!(a.key(), b.key());
        }
    }
}
