//! Shared editing through group membership.
//!
//! Users who share a group with a resource may update or delete it. The
//! decision is made by [`GroupOwnershipAssertion`] from group sets that the
//! [`Enricher`] attaches after each resource read or search, so the check
//! itself never touches storage.

pub mod assertion;
pub mod enrich;
pub mod error;
pub mod model;
pub mod resolver;
pub mod rules;
pub mod settings;
pub mod store;

pub use assertion::GroupOwnershipAssertion;
pub use enrich::{ApiEvent, Enricher, ResponsePayload};
pub use error::{GroupEditError, GroupEditResult};
pub use model::{GroupIds, GroupedResource, GroupedUser, HasGroups, Identity, ResourceRef};
pub use resolver::{GroupLookup, GroupResolver};
pub use rules::{GroupAcl, build_acl, register_acl_rules};
pub use settings::{GroupEditSettings, LookupFailurePolicy};
