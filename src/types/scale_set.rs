// ABOUTME: Scale-set naming helpers: validated name prefixes and resource id templating.
// ABOUTME: Resource ids are pure string templates over subscription/resource-group/name.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamePrefixError {
    #[error("name prefix cannot be empty")]
    Empty,

    #[error("name prefix exceeds maximum length of 58 characters")]
    TooLong,

    #[error("name prefix cannot start or end with a separator")]
    EdgeSeparator,

    #[error("invalid character in name prefix: '{0}'")]
    InvalidChar(char),
}

/// A validated scale-set name prefix.
///
/// The delegate appends a revision suffix (`__N`) to the prefix, so the
/// prefix itself is capped below the provider's 64-character resource-name
/// limit. Validation runs after expression rendering; raw expressions like
/// `${app.name}` never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePrefix(String);

impl NamePrefix {
    pub fn new(value: &str) -> Result<Self, NamePrefixError> {
        if value.is_empty() {
            return Err(NamePrefixError::Empty);
        }

        if value.len() > 58 {
            return Err(NamePrefixError::TooLong);
        }

        if value.starts_with(['-', '_']) || value.ends_with(['-', '_']) {
            return Err(NamePrefixError::EdgeSeparator);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(NamePrefixError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default name prefix when none is configured: `app__service__env`.
pub fn default_name_prefix(app_name: &str, service_name: &str, env_name: &str) -> String {
    format!("{}__{}__{}", app_name, service_name, env_name)
}

/// Fully-qualified resource id for a scale set.
///
/// An empty scale-set name yields an empty id: callers pass empty names
/// when no old scale set exists, and downstream code treats an empty id
/// as "no resource" rather than a malformed path.
pub fn scale_set_resource_id(subscription_id: &str, resource_group: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachineScaleSets/{}",
        subscription_id, resource_group, name
    )
}
