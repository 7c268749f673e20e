//! Group editing configuration read from `GROUPEDIT_*` variables.

use std::str::FromStr;

use platform_authz::{ResourceKind, Role};

use crate::error::{GroupEditError, GroupEditResult};

/// What the enricher does when a group lookup fails.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LookupFailurePolicy {
    /// Surface the storage error to the caller.
    #[default]
    Propagate,
    /// Attach an empty group set and carry on. Group edits are then denied.
    TreatAsNoGroups,
}

impl FromStr for LookupFailurePolicy {
    type Err = GroupEditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "no-groups" => Ok(Self::TreatAsNoGroups),
            other => Err(GroupEditError::InvalidSetting {
                key: "GROUPEDIT_LOOKUP_FAILURE",
                reason: format!("expected `propagate` or `no-groups`, got `{other}`"),
            }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupEditSettings {
    /// Non-admin roles granted update/delete through shared groups.
    pub assertion_roles: Vec<Role>,
    /// Also cover resource templates.
    pub include_resource_templates: bool,
    pub lookup_failure: LookupFailurePolicy,
}

impl Default for GroupEditSettings {
    fn default() -> Self {
        Self {
            assertion_roles: vec![Role::Author],
            include_resource_templates: true,
            lookup_failure: LookupFailurePolicy::Propagate,
        }
    }
}

impl GroupEditSettings {
    pub fn from_env() -> GroupEditResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds settings from a variable source, falling back to defaults for
    /// anything unset.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> GroupEditResult<Self> {
        let mut settings = Self::default();

        if let Some(raw) = var("GROUPEDIT_ROLES") {
            settings.assertion_roles = parse_roles(&raw)?;
        }

        if let Some(raw) = var("GROUPEDIT_INCLUDE_TEMPLATES") {
            settings.include_resource_templates = parse_flag("GROUPEDIT_INCLUDE_TEMPLATES", &raw)?;
        }

        if let Some(raw) = var("GROUPEDIT_LOOKUP_FAILURE") {
            settings.lookup_failure = raw.parse()?;
        }

        Ok(settings)
    }

    /// Resource kinds whose update/delete the group check covers, which are
    /// also the adapters the enricher listens to.
    pub fn resource_kinds(&self) -> Vec<ResourceKind> {
        let mut kinds = vec![ResourceKind::Item, ResourceKind::ItemSet, ResourceKind::Media];
        if self.include_resource_templates {
            kinds.push(ResourceKind::ResourceTemplate);
        }
        kinds
    }
}

fn parse_roles(raw: &str) -> GroupEditResult<Vec<Role>> {
    let invalid = |reason: String| GroupEditError::InvalidSetting {
        key: "GROUPEDIT_ROLES",
        reason,
    };

    let mut roles = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let role = part.parse::<Role>().map_err(|err| invalid(err.to_string()))?;
        // admins already hold every privilege
        if role.is_admin() {
            return Err(invalid(format!("`{role}` is an administrator role")));
        }
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        return Err(invalid("at least one role is required".to_string()));
    }
    Ok(roles)
}

fn parse_flag(key: &'static str, raw: &str) -> GroupEditResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(GroupEditError::InvalidSetting {
            key,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}
