//! Attaches group sets after resource reads and searches.
//!
//! The host fires [`ApiEvent::ReadPost`] and [`ApiEvent::SearchPost`] once the
//! response payload is loaded. The enricher looks up the acting user's groups
//! and the groups of every resource in the payload, and stores them on the
//! request-scoped wrappers so a later update/delete check can read them.
//! Sets are recomputed on every call.

use platform_authz::ResourceKind;
use tracing::{debug, instrument, warn};

use crate::{
    error::{GroupEditError, GroupEditResult},
    model::{GroupIds, GroupedResource, GroupedUser},
    resolver::GroupLookup,
    settings::{GroupEditSettings, LookupFailurePolicy},
};

/// Hook points the enricher subscribes to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ApiEvent {
    ReadPost,
    SearchPost,
}

/// Response content of a read (one resource) or a search (many).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsePayload {
    One(GroupedResource),
    Many(Vec<GroupedResource>),
}

impl ResponsePayload {
    pub fn resources(&self) -> &[GroupedResource] {
        match self {
            ResponsePayload::One(resource) => std::slice::from_ref(resource),
            ResponsePayload::Many(resources) => resources,
        }
    }

    pub fn resources_mut(&mut self) -> &mut [GroupedResource] {
        match self {
            ResponsePayload::One(resource) => std::slice::from_mut(resource),
            ResponsePayload::Many(resources) => resources,
        }
    }
}

pub struct Enricher<L> {
    lookup: L,
    kinds: Vec<ResourceKind>,
    on_failure: LookupFailurePolicy,
}

impl<L: GroupLookup> Enricher<L> {
    pub fn new(lookup: L, settings: &GroupEditSettings) -> Self {
        Self {
            lookup,
            kinds: settings.resource_kinds(),
            on_failure: settings.lookup_failure,
        }
    }

    pub fn listens_to(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Every (adapter, event) pair the host should route here.
    pub fn subscriptions(&self) -> Vec<(ResourceKind, ApiEvent)> {
        self.kinds
            .iter()
            .flat_map(|kind| [(*kind, ApiEvent::ReadPost), (*kind, ApiEvent::SearchPost)])
            .collect()
    }

    /// Single entry point for the host's event dispatcher. A read carries one
    /// resource and a search carries a list.
    #[instrument(skip_all, fields(event = ?event, resources = payload.resources().len()))]
    pub async fn handle(
        &self,
        event: ApiEvent,
        user: Option<&mut GroupedUser>,
        payload: &mut ResponsePayload,
    ) -> GroupEditResult<()> {
        match (event, payload) {
            (ApiEvent::ReadPost, ResponsePayload::One(resource)) => {
                self.handle_read_post(user, resource).await
            }
            (ApiEvent::SearchPost, ResponsePayload::Many(resources)) => {
                self.handle_search_post(user, resources).await
            }
            (ApiEvent::ReadPost, ResponsePayload::Many(_)) => Err(GroupEditError::PayloadMismatch {
                event,
                expected: "single resource",
            }),
            (ApiEvent::SearchPost, ResponsePayload::One(_)) => Err(GroupEditError::PayloadMismatch {
                event,
                expected: "resource list",
            }),
        }
    }

    pub async fn handle_read_post(
        &self,
        user: Option<&mut GroupedUser>,
        resource: &mut GroupedResource,
    ) -> GroupEditResult<()> {
        self.enrich(user, std::slice::from_mut(resource)).await
    }

    pub async fn handle_search_post(
        &self,
        user: Option<&mut GroupedUser>,
        resources: &mut [GroupedResource],
    ) -> GroupEditResult<()> {
        self.enrich(user, resources).await
    }

    async fn enrich(
        &self,
        user: Option<&mut GroupedUser>,
        resources: &mut [GroupedResource],
    ) -> GroupEditResult<()> {
        let Some(user) = user else {
            debug!("anonymous request, skipping group enrichment");
            return Ok(());
        };

        let user_id = user.identity().user_id;
        let groups = self.recover(self.lookup.groups_for_user(user_id).await, "user", user_id)?;
        user.attach_groups(groups);

        for resource in resources.iter_mut() {
            if !self.listens_to(resource.resource().kind) {
                continue;
            }
            let resource_id = resource.id();
            let groups = self.recover(
                self.lookup.groups_for_resource(resource_id).await,
                "resource",
                resource_id,
            )?;
            resource.attach_groups(groups);
        }
        Ok(())
    }

    fn recover(
        &self,
        result: GroupEditResult<GroupIds>,
        entity: &'static str,
        id: i32,
    ) -> GroupEditResult<GroupIds> {
        match (result, self.on_failure) {
            (Ok(groups), _) => Ok(groups),
            (Err(err), LookupFailurePolicy::Propagate) => Err(err),
            (Err(err), LookupFailurePolicy::TreatAsNoGroups) => {
                warn!(entity, id, error = %err, "group lookup failed, treating as no groups");
                Ok(GroupIds::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{HasGroups, Identity, ResourceRef},
        resolver::MockGroupLookup,
    };
    use mockall::predicate::eq;
    use platform_authz::Role;
    use sea_orm::DbErr;

    fn author(id: i32) -> GroupedUser {
        GroupedUser::new(Identity::new(id, Role::Author))
    }

    fn resource(id: i32, kind: ResourceKind) -> GroupedResource {
        GroupedResource::new(ResourceRef::new(id, kind, None))
    }

    #[tokio::test]
    async fn search_enriches_every_resource_and_user_once() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .with(eq(7))
            .times(1)
            .returning(|_| Ok(GroupIds::from([5])));
        lookup
            .expect_groups_for_resource()
            .times(3)
            .returning(|id| Ok(GroupIds::from([id * 10])));

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut user = author(7);
        let mut payload = ResponsePayload::Many(vec![
            resource(1, ResourceKind::Item),
            resource(2, ResourceKind::Media),
            resource(3, ResourceKind::ItemSet),
        ]);

        enricher
            .handle(ApiEvent::SearchPost, Some(&mut user), &mut payload)
            .await
            .unwrap();

        assert_eq!(user.group_ids(), Some(&GroupIds::from([5])));
        let attached: Vec<_> = payload
            .resources()
            .iter()
            .map(|r| r.group_ids().cloned())
            .collect();
        assert_eq!(
            attached,
            vec![
                Some(GroupIds::from([10])),
                Some(GroupIds::from([20])),
                Some(GroupIds::from([30])),
            ]
        );
    }

    #[tokio::test]
    async fn anonymous_request_is_a_no_op() {
        let mut lookup = MockGroupLookup::new();
        lookup.expect_groups_for_user().never();
        lookup.expect_groups_for_resource().never();

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut item = resource(1, ResourceKind::Item);
        enricher.handle_read_post(None, &mut item).await.unwrap();
        assert!(item.group_ids().is_none());
    }

    #[tokio::test]
    async fn read_overwrites_stale_groups() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .returning(|_| Ok(GroupIds::new()));
        lookup
            .expect_groups_for_resource()
            .with(eq(4))
            .returning(|_| Ok(GroupIds::from([2])));

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut user = author(1).with_groups([99]);
        let mut item = resource(4, ResourceKind::Item).with_groups([98]);
        enricher
            .handle_read_post(Some(&mut user), &mut item)
            .await
            .unwrap();
        assert_eq!(user.group_ids(), Some(&GroupIds::new()));
        assert_eq!(item.group_ids(), Some(&GroupIds::from([2])));
    }

    #[tokio::test]
    async fn templates_skipped_when_not_configured() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .returning(|_| Ok(GroupIds::from([1])));
        lookup
            .expect_groups_for_resource()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(GroupIds::from([1])));

        let settings = GroupEditSettings {
            include_resource_templates: false,
            ..GroupEditSettings::default()
        };
        let enricher = Enricher::new(lookup, &settings);
        assert!(!enricher.listens_to(ResourceKind::ResourceTemplate));

        let mut results = vec![
            resource(1, ResourceKind::Item),
            resource(2, ResourceKind::ResourceTemplate),
        ];
        enricher
            .handle_search_post(Some(&mut author(1)), &mut results)
            .await
            .unwrap();
        assert!(results[0].group_ids().is_some());
        assert!(results[1].group_ids().is_none());
    }

    #[tokio::test]
    async fn lookup_failure_propagates_by_default() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .returning(|_| Err(GroupEditError::Storage(DbErr::Custom("down".into()))));

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut user = author(1);
        let mut item = resource(1, ResourceKind::Item);
        let err = enricher
            .handle_read_post(Some(&mut user), &mut item)
            .await
            .unwrap_err();
        assert!(matches!(err, GroupEditError::Storage(_)));
        assert!(user.group_ids().is_none());
    }

    #[tokio::test]
    async fn lookup_failure_can_degrade_to_no_groups() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .returning(|_| Ok(GroupIds::from([3])));
        lookup
            .expect_groups_for_resource()
            .returning(|_| Err(GroupEditError::Storage(DbErr::Custom("down".into()))));

        let settings = GroupEditSettings {
            lookup_failure: LookupFailurePolicy::TreatAsNoGroups,
            ..GroupEditSettings::default()
        };
        let enricher = Enricher::new(lookup, &settings);
        let mut user = author(1);
        let mut item = resource(1, ResourceKind::Item);
        enricher
            .handle_read_post(Some(&mut user), &mut item)
            .await
            .unwrap();
        assert_eq!(item.group_ids(), Some(&GroupIds::new()));
    }

    #[tokio::test]
    async fn event_must_match_payload_shape() {
        let mut lookup = MockGroupLookup::new();
        lookup.expect_groups_for_user().never();
        lookup.expect_groups_for_resource().never();

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut user = author(1);

        let mut many = ResponsePayload::Many(vec![resource(1, ResourceKind::Item)]);
        let err = enricher
            .handle(ApiEvent::ReadPost, Some(&mut user), &mut many)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GroupEditError::PayloadMismatch { event: ApiEvent::ReadPost, .. }
        ));

        let mut one = ResponsePayload::One(resource(1, ResourceKind::Item));
        let err = enricher
            .handle(ApiEvent::SearchPost, Some(&mut user), &mut one)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "SearchPost does not carry a resource list payload");
        assert!(user.group_ids().is_none());
        assert!(one.resources()[0].group_ids().is_none());
    }

    #[tokio::test]
    async fn read_event_enriches_single_payload() {
        let mut lookup = MockGroupLookup::new();
        lookup
            .expect_groups_for_user()
            .times(1)
            .returning(|_| Ok(GroupIds::from([4])));
        lookup
            .expect_groups_for_resource()
            .with(eq(9))
            .times(1)
            .returning(|_| Ok(GroupIds::from([4])));

        let enricher = Enricher::new(lookup, &GroupEditSettings::default());
        let mut user = author(1);
        let mut payload = ResponsePayload::One(resource(9, ResourceKind::Media));
        enricher
            .handle(ApiEvent::ReadPost, Some(&mut user), &mut payload)
            .await
            .unwrap();
        assert_eq!(payload.resources()[0].group_ids(), Some(&GroupIds::from([4])));
    }

    #[test]
    fn subscribes_read_and_search_per_adapter() {
        let settings = GroupEditSettings {
            include_resource_templates: false,
            ..GroupEditSettings::default()
        };
        let enricher = Enricher::new(MockGroupLookup::new(), &settings);
        let subs = enricher.subscriptions();
        assert_eq!(subs.len(), 6);
        assert!(subs.contains(&(ResourceKind::Media, ApiEvent::SearchPost)));
        assert!(!subs.iter().any(|(kind, _)| *kind == ResourceKind::ResourceTemplate));
    }
}
