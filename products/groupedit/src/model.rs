//! Request-scoped views of users and resources carrying their group sets.

use std::collections::BTreeSet;

use entity::{resource, users};
use platform_authz::{AclResource, AclRole, ResourceKind, Role};

use crate::error::GroupEditError;

/// Group IDs an entity belongs to. Ordered, without duplicates.
pub type GroupIds = BTreeSet<i32>;

/// Read access to an attached group set.
///
/// `None` means the entity was never enriched. `Some` of an empty set means
/// it was enriched and belongs to no group.
pub trait HasGroups {
    fn group_ids(&self) -> Option<&GroupIds>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl From<&users::Model> for Identity {
    fn from(model: &users::Model) -> Self {
        Self::new(model.id, role_from_entity(model.role))
    }
}

fn role_from_entity(role: users::Role) -> Role {
    match role {
        users::Role::GlobalAdmin => Role::GlobalAdmin,
        users::Role::SiteAdmin => Role::SiteAdmin,
        users::Role::Editor => Role::Editor,
        users::Role::Reviewer => Role::Reviewer,
        users::Role::Author => Role::Author,
        users::Role::Researcher => Role::Researcher,
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: i32,
    pub kind: ResourceKind,
    pub owner_id: Option<i32>,
}

impl ResourceRef {
    pub fn new(id: i32, kind: ResourceKind, owner_id: Option<i32>) -> Self {
        Self { id, kind, owner_id }
    }
}

impl From<&resource::Model> for ResourceRef {
    fn from(model: &resource::Model) -> Self {
        Self::new(model.id, kind_from_entity(model.resource_type), model.owner_id)
    }
}

pub(crate) fn kind_from_entity(resource_type: resource::ResourceType) -> ResourceKind {
    match resource_type {
        resource::ResourceType::Item => ResourceKind::Item,
        resource::ResourceType::ItemSet => ResourceKind::ItemSet,
        resource::ResourceType::Media => ResourceKind::Media,
        resource::ResourceType::ResourceTemplate => ResourceKind::ResourceTemplate,
    }
}

pub(crate) fn kind_to_entity(kind: ResourceKind) -> Result<resource::ResourceType, GroupEditError> {
    match kind {
        ResourceKind::Item => Ok(resource::ResourceType::Item),
        ResourceKind::ItemSet => Ok(resource::ResourceType::ItemSet),
        ResourceKind::Media => Ok(resource::ResourceType::Media),
        ResourceKind::ResourceTemplate => Ok(resource::ResourceType::ResourceTemplate),
        other => Err(GroupEditError::NotAResourceType(other)),
    }
}

/// The acting user plus the groups it was found in for this request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupedUser {
    identity: Identity,
    group_ids: Option<GroupIds>,
}

impl GroupedUser {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            group_ids: None,
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = i32>) -> Self {
        self.attach_groups(groups.into_iter().collect());
        self
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Replaces whatever set was attached before.
    pub fn attach_groups(&mut self, groups: GroupIds) {
        self.group_ids = Some(groups);
    }
}

impl HasGroups for GroupedUser {
    fn group_ids(&self) -> Option<&GroupIds> {
        self.group_ids.as_ref()
    }
}

impl AclRole for GroupedUser {
    fn role(&self) -> Role {
        self.identity.role
    }

    fn user_id(&self) -> Option<i32> {
        Some(self.identity.user_id)
    }
}

/// A loaded resource plus the groups it is assigned to for this request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupedResource {
    resource: ResourceRef,
    group_ids: Option<GroupIds>,
}

impl GroupedResource {
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            group_ids: None,
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = i32>) -> Self {
        self.attach_groups(groups.into_iter().collect());
        self
    }

    pub fn resource(&self) -> ResourceRef {
        self.resource
    }

    pub fn id(&self) -> i32 {
        self.resource.id
    }

    /// Replaces whatever set was attached before.
    pub fn attach_groups(&mut self, groups: GroupIds) {
        self.group_ids = Some(groups);
    }
}

impl From<ResourceRef> for GroupedResource {
    fn from(resource: ResourceRef) -> Self {
        Self::new(resource)
    }
}

impl HasGroups for GroupedResource {
    fn group_ids(&self) -> Option<&GroupIds> {
        self.group_ids.as_ref()
    }
}

impl AclResource for GroupedResource {
    fn kind(&self) -> ResourceKind {
        self.resource.kind
    }

    fn owner_id(&self) -> Option<i32> {
        self.resource.owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_wrappers_carry_no_groups() {
        let user = GroupedUser::new(Identity::new(1, Role::Author));
        let item = GroupedResource::new(ResourceRef::new(10, ResourceKind::Item, Some(1)));
        assert!(user.group_ids().is_none());
        assert!(item.group_ids().is_none());
    }

    #[test]
    fn attaching_replaces_previous_set() {
        let mut user = GroupedUser::new(Identity::new(1, Role::Author)).with_groups([1, 2, 2]);
        assert_eq!(user.group_ids(), Some(&GroupIds::from([1, 2])));
        user.attach_groups(GroupIds::new());
        assert_eq!(user.group_ids(), Some(&GroupIds::new()));
    }

    #[test]
    fn group_kinds_are_not_stored_resources() {
        assert!(matches!(
            kind_to_entity(ResourceKind::GroupResource),
            Err(GroupEditError::NotAResourceType(ResourceKind::GroupResource))
        ));
        assert_eq!(
            kind_from_entity(kind_to_entity(ResourceKind::Media).unwrap()),
            ResourceKind::Media
        );
    }
}
