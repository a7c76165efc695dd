//! Engine configuration.

use crate::error::ConfigError;

/// Tunables for [`Guardian`](crate::engine::Guardian).
///
/// Every field has a default so a partial JSON document (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Users inherit the grants of the groups they belong to.
    pub group_inheritance: bool,
    /// `get_users_with_perms` includes users who only hold a permission through a group.
    pub with_group_users: bool,
    /// Separator between entity type and codename in a qualified codename,
    /// e.g. `project.change_project`.
    pub qualifier_separator: char,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        GuardianConfig {
            group_inheritance: true,
            with_group_users: true,
            qualifier_separator: '.',
        }
    }
}

impl GuardianConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GuardianConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The separator must never occur inside a codename.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sep = self.qualifier_separator;
        if sep.is_alphanumeric() || sep == '_' || sep.is_whitespace() {
            return Err(ConfigError::Invalid(format!(
                "qualifier_separator '{}' may appear inside codenames",
                sep
            )));
        }
        Ok(())
    }
}
