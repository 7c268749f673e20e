//! The group ownership check registered for update/delete rules.

use platform_authz::{Assertion, OwnsEntityAssertion, Privilege};
use tracing::trace;

use crate::model::{GroupIds, HasGroups};

/// Grants when the direct-ownership check grants, or when the acting user
/// shares at least one group with the resource.
///
/// A missing or empty group set on either side never grants. The ACL then
/// treats the rule as not applying.
#[derive(Clone, Debug, Default)]
pub struct GroupOwnershipAssertion<O = OwnsEntityAssertion> {
    ownership: O,
}

impl<O> GroupOwnershipAssertion<O> {
    pub fn new(ownership: O) -> Self {
        Self { ownership }
    }

    pub fn permitted<R, T>(&self, role: &R, resource: &T, privilege: Privilege) -> bool
    where
        O: Assertion<R, T>,
        R: HasGroups,
        T: HasGroups,
    {
        if self.ownership.assert(role, resource, privilege) {
            trace!(%privilege, "granted by direct ownership");
            return true;
        }

        let (Some(user_groups), Some(resource_groups)) = (role.group_ids(), resource.group_ids())
        else {
            trace!(%privilege, "group sets not attached");
            return false;
        };

        let shared = groups_intersect(user_groups, resource_groups);
        trace!(%privilege, shared, "group ownership evaluated");
        shared
    }
}

impl<R, T, O> Assertion<R, T> for GroupOwnershipAssertion<O>
where
    R: HasGroups,
    T: HasGroups,
    O: Assertion<R, T>,
{
    fn assert(&self, role: &R, resource: &T, privilege: Privilege) -> bool {
        self.permitted(role, resource, privilege)
    }
}

/// True when both sets are non-empty and share an element.
pub fn groups_intersect(left: &GroupIds, right: &GroupIds) -> bool {
    !left.is_empty() && !right.is_empty() && !left.is_disjoint(right)
}
