//! ACL rules contributed by group editing.

use std::sync::Arc;

use platform_authz::{Acl, Assertion, OwnsEntityAssertion, Privilege, ResourceKind, Role};
use tracing::debug;

use crate::{
    assertion::GroupOwnershipAssertion,
    model::{GroupedResource, GroupedUser},
    settings::GroupEditSettings,
};

pub type GroupAcl = Acl<GroupedUser, GroupedResource>;

/// Non-admin roles allowed to manage group assignments.
pub const GROUP_MANAGER_ROLES: [Role; 3] = [Role::Author, Role::Reviewer, Role::Editor];

pub fn register_acl_rules<O>(
    acl: &mut GroupAcl,
    settings: &GroupEditSettings,
    assertion: GroupOwnershipAssertion<O>,
) where
    O: Assertion<GroupedUser, GroupedResource> + 'static,
{
    // assign gates the group selector on resource forms
    acl.allow(
        GROUP_MANAGER_ROLES,
        [ResourceKind::GroupResource],
        [
            Privilege::Read,
            Privilege::Create,
            Privilege::Update,
            Privilege::Delete,
            Privilege::Assign,
        ],
        None,
    );

    acl.allow(
        [Role::Author],
        [ResourceKind::Group],
        [Privilege::Search, Privilege::Read],
        None,
    );

    let kinds = settings.resource_kinds();
    debug!(roles = ?settings.assertion_roles, ?kinds, "registering group ownership rule");
    acl.allow(
        settings.assertion_roles.iter().copied(),
        kinds,
        [Privilege::Update, Privilege::Delete],
        Some(Arc::new(assertion)),
    );
}

/// An ACL holding only the group editing rules, with the stock ownership check.
pub fn build_acl(settings: &GroupEditSettings) -> GroupAcl {
    let mut acl = GroupAcl::new();
    register_acl_rules(
        &mut acl,
        settings,
        GroupOwnershipAssertion::new(OwnsEntityAssertion),
    );
    acl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, ResourceRef};
    use platform_authz::Decision;

    fn user(id: i32, role: Role, groups: &[i32]) -> GroupedUser {
        GroupedUser::new(Identity::new(id, role)).with_groups(groups.iter().copied())
    }

    fn resource(kind: ResourceKind, owner: i32, groups: &[i32]) -> GroupedResource {
        GroupedResource::new(ResourceRef::new(50, kind, Some(owner)))
            .with_groups(groups.iter().copied())
    }

    #[test]
    fn author_sharing_a_group_may_edit() {
        let acl = build_acl(&GroupEditSettings::default());
        let author = user(1, Role::Author, &[5]);
        let item = resource(ResourceKind::Item, 2, &[5, 9]);
        assert!(acl.is_allowed(&author, &item, Privilege::Update));
        assert!(acl.is_allowed(&author, &item, Privilege::Delete));
        assert!(!acl.is_allowed(&author, &item, Privilege::Create));
    }

    #[test]
    fn author_outside_the_group_is_denied() {
        let acl = build_acl(&GroupEditSettings::default());
        let author = user(1, Role::Author, &[5]);
        let item = resource(ResourceKind::Media, 2, &[9]);
        assert_eq!(
            acl.decide(&author, &item, Privilege::Update),
            Decision::DeniedByDefault
        );
    }

    #[test]
    fn owner_may_edit_without_groups() {
        let acl = build_acl(&GroupEditSettings::default());
        let author = GroupedUser::new(Identity::new(2, Role::Author));
        let item = GroupedResource::new(ResourceRef::new(50, ResourceKind::ItemSet, Some(2)));
        assert!(acl.is_allowed(&author, &item, Privilege::Delete));
    }

    #[test]
    fn group_rule_only_covers_configured_roles() {
        let acl = build_acl(&GroupEditSettings::default());
        let reviewer = user(1, Role::Reviewer, &[5]);
        let item = resource(ResourceKind::Item, 2, &[5]);
        assert!(!acl.is_allowed(&reviewer, &item, Privilege::Update));

        let settings = GroupEditSettings {
            assertion_roles: vec![Role::Author, Role::Reviewer],
            ..GroupEditSettings::default()
        };
        let acl = build_acl(&settings);
        assert!(acl.is_allowed(&reviewer, &item, Privilege::Update));
    }

    #[test]
    fn templates_follow_configuration() {
        let author = user(1, Role::Author, &[5]);
        let template = resource(ResourceKind::ResourceTemplate, 2, &[5]);
        assert!(build_acl(&GroupEditSettings::default()).is_allowed(
            &author,
            &template,
            Privilege::Update
        ));

        let settings = GroupEditSettings {
            include_resource_templates: false,
            ..GroupEditSettings::default()
        };
        assert!(!build_acl(&settings).is_allowed(&author, &template, Privilege::Update));
    }

    #[test]
    fn managers_may_assign_groups_and_authors_browse_them() {
        let acl = build_acl(&GroupEditSettings::default());
        let assignment = resource(ResourceKind::GroupResource, 2, &[]);
        let group = resource(ResourceKind::Group, 2, &[]);
        for role in GROUP_MANAGER_ROLES {
            assert!(acl.is_allowed(&user(1, role, &[]), &assignment, Privilege::Assign));
        }
        assert!(!acl.is_allowed(&user(1, Role::Researcher, &[]), &assignment, Privilege::Assign));
        assert!(acl.is_allowed(&user(1, Role::Author, &[]), &group, Privilege::Search));
        assert!(!acl.is_allowed(&user(1, Role::Editor, &[]), &group, Privilege::Search));
    }
}
