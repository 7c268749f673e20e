//! Role/resource/privilege access control.
//!
//! The host decides permissions from a table of rules. Each rule names the
//! roles, resource kinds and privileges it covers, and may carry an
//! [`Assertion`] consulted at evaluation time. A rule whose assertion fails
//! does not apply. Among applying rules an explicit deny beats an explicit
//! allow, and anything not allowed is denied.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown privilege: {0}")]
    UnknownPrivilege(String),
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    GlobalAdmin,
    SiteAdmin,
    Editor,
    Reviewer,
    Author,
    Researcher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::GlobalAdmin => "global_admin",
            Role::SiteAdmin => "site_admin",
            Role::Editor => "editor",
            Role::Reviewer => "reviewer",
            Role::Author => "author",
            Role::Researcher => "researcher",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::GlobalAdmin | Role::SiteAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global_admin" => Ok(Role::GlobalAdmin),
            "site_admin" => Ok(Role::SiteAdmin),
            "editor" => Ok(Role::Editor),
            "reviewer" => Ok(Role::Reviewer),
            "author" => Ok(Role::Author),
            "researcher" => Ok(Role::Researcher),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    Read,
    Create,
    Update,
    Delete,
    Assign,
    Search,
}

impl Privilege {
    pub fn as_str(self) -> &'static str {
        match self {
            Privilege::Read => "read",
            Privilege::Create => "create",
            Privilege::Update => "update",
            Privilege::Delete => "delete",
            Privilege::Assign => "assign",
            Privilege::Search => "search",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privilege {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Privilege::Read),
            "create" => Ok(Privilege::Create),
            "update" => Ok(Privilege::Update),
            "delete" => Ok(Privilege::Delete),
            "assign" => Ok(Privilege::Assign),
            "search" => Ok(Privilege::Search),
            other => Err(AuthzError::UnknownPrivilege(other.to_string())),
        }
    }
}

/// ACL resource identifiers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Item,
    ItemSet,
    Media,
    ResourceTemplate,
    Group,
    GroupResource,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Item => "item",
            ResourceKind::ItemSet => "item_set",
            ResourceKind::Media => "media",
            ResourceKind::ResourceTemplate => "resource_template",
            ResourceKind::Group => "group",
            ResourceKind::GroupResource => "group_resource",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "item" => Ok(ResourceKind::Item),
            "item_set" => Ok(ResourceKind::ItemSet),
            "media" => Ok(ResourceKind::Media),
            "resource_template" => Ok(ResourceKind::ResourceTemplate),
            "group" => Ok(ResourceKind::Group),
            "group_resource" => Ok(ResourceKind::GroupResource),
            other => Err(AuthzError::UnknownResourceKind(other.to_string())),
        }
    }
}

/// The acting identity as the ACL sees it.
pub trait AclRole {
    fn role(&self) -> Role;
    fn user_id(&self) -> Option<i32>;
}

/// The object being acted upon as the ACL sees it.
pub trait AclResource {
    fn kind(&self) -> ResourceKind;
    fn owner_id(&self) -> Option<i32>;
}

/// Boolean check attached to a rule.
pub trait Assertion<R: ?Sized, T: ?Sized>: Send + Sync {
    fn assert(&self, role: &R, resource: &T, privilege: Privilege) -> bool;
}

impl<R: ?Sized, T: ?Sized, A: Assertion<R, T> + ?Sized> Assertion<R, T> for Arc<A> {
    fn assert(&self, role: &R, resource: &T, privilege: Privilege) -> bool {
        (**self).assert(role, resource, privilege)
    }
}

/// Grants when the acting user owns the resource.
#[derive(Copy, Clone, Debug, Default)]
pub struct OwnsEntityAssertion;

impl<R: AclRole + ?Sized, T: AclResource + ?Sized> Assertion<R, T> for OwnsEntityAssertion {
    fn assert(&self, role: &R, resource: &T, _privilege: Privilege) -> bool {
        match (role.user_id(), resource.owner_id()) {
            (Some(user), Some(owner)) => user == owner,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Effect {
    Allow,
    Deny,
}

struct Rule<R, T> {
    effect: Effect,
    roles: Vec<Role>,
    kinds: Vec<ResourceKind>,
    privileges: Vec<Privilege>,
    assertion: Option<Arc<dyn Assertion<R, T>>>,
}

impl<R, T> Rule<R, T> {
    fn covers(&self, role: Role, kind: ResourceKind, privilege: Privilege) -> bool {
        self.roles.contains(&role) && self.kinds.contains(&kind) && self.privileges.contains(&privilege)
    }
}

/// Outcome of an ACL evaluation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Allowed,
    ExplicitlyDenied,
    DeniedByDefault,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub struct Acl<R, T> {
    rules: Vec<Rule<R, T>>,
}

impl<R, T> Default for Acl<R, T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<R, T> fmt::Debug for Acl<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acl").field("rules", &self.rules.len()).finish()
    }
}

impl<R: AclRole, T: AclResource> Acl<R, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(
        &mut self,
        roles: impl IntoIterator<Item = Role>,
        kinds: impl IntoIterator<Item = ResourceKind>,
        privileges: impl IntoIterator<Item = Privilege>,
        assertion: Option<Arc<dyn Assertion<R, T>>>,
    ) -> &mut Self {
        self.push(Effect::Allow, roles, kinds, privileges, assertion)
    }

    pub fn deny(
        &mut self,
        roles: impl IntoIterator<Item = Role>,
        kinds: impl IntoIterator<Item = ResourceKind>,
        privileges: impl IntoIterator<Item = Privilege>,
        assertion: Option<Arc<dyn Assertion<R, T>>>,
    ) -> &mut Self {
        self.push(Effect::Deny, roles, kinds, privileges, assertion)
    }

    fn push(
        &mut self,
        effect: Effect,
        roles: impl IntoIterator<Item = Role>,
        kinds: impl IntoIterator<Item = ResourceKind>,
        privileges: impl IntoIterator<Item = Privilege>,
        assertion: Option<Arc<dyn Assertion<R, T>>>,
    ) -> &mut Self {
        self.rules.push(Rule {
            effect,
            roles: roles.into_iter().collect(),
            kinds: kinds.into_iter().collect(),
            privileges: privileges.into_iter().collect(),
            assertion,
        });
        self
    }

    pub fn decide(&self, role: &R, resource: &T, privilege: Privilege) -> Decision {
        let (acting, kind) = (role.role(), resource.kind());
        let mut allowed = false;
        for rule in self.rules.iter().filter(|rule| rule.covers(acting, kind, privilege)) {
            let applies = rule
                .assertion
                .as_ref()
                .is_none_or(|assertion| assertion.assert(role, resource, privilege));
            if !applies {
                continue;
            }
            match rule.effect {
                Effect::Deny => {
                    trace!(%acting, %kind, %privilege, "explicit deny");
                    return Decision::ExplicitlyDenied;
                }
                Effect::Allow => allowed = true,
            }
        }
        let decision = if allowed {
            Decision::Allowed
        } else {
            Decision::DeniedByDefault
        };
        trace!(%acting, %kind, %privilege, ?decision, "acl evaluated");
        decision
    }

    pub fn is_allowed(&self, role: &R, resource: &T, privilege: Privilege) -> bool {
        self.decide(role, resource, privilege).is_allowed()
    }
}
