//! Query scoping for resource listings.
//!
//! Translates a principal's viewable types into a filter the query layer can
//! apply. An empty viewable set never means "no filter": it renders a
//! predicate that structurally matches zero rows.

use std::collections::BTreeSet;

use serde::Serialize;
use warden_types::ResourceType;

use crate::error::{PolicyError, Result};

/// Row scope for a principal's resource queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "types", rename_all = "snake_case")]
pub enum ViewScope {
    /// No filter. Only produced for unrestricted roles.
    Unrestricted,

    /// Rows whose type is one of these. Never empty.
    Types(BTreeSet<ResourceType>),

    /// No rows at all.
    Nothing,
}

impl ViewScope {
    /// Builds a restricted scope from a set, collapsing the empty set to
    /// [`ViewScope::Nothing`].
    pub fn restricted(types: BTreeSet<ResourceType>) -> Self {
        if types.is_empty() {
            ViewScope::Nothing
        } else {
            ViewScope::Types(types)
        }
    }

    /// Returns whether a row of the given type is inside the scope.
    pub fn allows(&self, resource_type: &ResourceType) -> bool {
        match self {
            ViewScope::Unrestricted => true,
            ViewScope::Types(types) => types.contains(resource_type),
            ViewScope::Nothing => false,
        }
    }

    /// Returns whether this scope can match any row.
    pub fn is_empty(&self) -> bool {
        matches!(self, ViewScope::Nothing)
    }

    /// Generates a SQL predicate (without the `WHERE` keyword).
    ///
    /// # Returns
    ///
    /// - `""` for [`ViewScope::Unrestricted`]
    /// - `type IN ('A', 'B')` for [`ViewScope::Types`]
    /// - `FALSE` for [`ViewScope::Nothing`]
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::UnsafeLabel`] if a label cannot be embedded as a
    /// single-quoted string literal.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use warden_rbac::ViewScope;
    /// use warden_types::ResourceType;
    ///
    /// let scope = ViewScope::restricted(BTreeSet::from([ResourceType::new("Vehicle")]));
    /// assert_eq!(scope.to_where_clause("type").unwrap(), "type IN ('Vehicle')");
    ///
    /// let nothing = ViewScope::restricted(BTreeSet::new());
    /// assert_eq!(nothing.to_where_clause("type").unwrap(), "FALSE");
    /// ```
    pub fn to_where_clause(&self, column: &str) -> Result<String> {
        match self {
            ViewScope::Unrestricted => Ok(String::new()),
            ViewScope::Nothing => Ok("FALSE".to_string()),
            ViewScope::Types(types) => {
                let mut literals = Vec::with_capacity(types.len());
                for resource_type in types {
                    literals.push(quote_literal(resource_type.as_str())?);
                }
                Ok(format!("{column} IN ({})", literals.join(", ")))
            }
        }
    }
}

/// Quotes a label as a SQL string literal.
///
/// Rejects labels with embedded quotes, backslashes or control characters
/// rather than escaping them.
fn quote_literal(label: &str) -> Result<String> {
    if label.is_empty() || label.chars().any(|c| c == '\'' || c == '\\' || c.is_control()) {
        return Err(PolicyError::UnsafeLabel(label.to_string()));
    }
    Ok(format!("'{label}'"))
}
