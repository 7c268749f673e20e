//! Group membership lookups over the join tables.

use std::sync::Arc;

use async_trait::async_trait;
use entity::{group_resource, group_user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::{error::GroupEditResult, model::GroupIds};

/// Source of group sets for users and resources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupLookup: Send + Sync {
    /// Groups the user is a member of. Empty when the user has none.
    async fn groups_for_user(&self, user_id: i32) -> GroupEditResult<GroupIds>;

    /// Groups the resource is assigned to. Empty when unassigned.
    async fn groups_for_resource(&self, resource_id: i32) -> GroupEditResult<GroupIds>;
}

/// [`GroupLookup`] backed by the `group_user` and `group_resource` tables.
///
/// The connection is shared, so callers keep using it for their own queries.
#[derive(Clone, Debug)]
pub struct GroupResolver {
    db: Arc<DatabaseConnection>,
}

impl GroupResolver {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }
}

#[async_trait]
impl GroupLookup for GroupResolver {
    #[instrument(skip(self), level = "debug")]
    async fn groups_for_user(&self, user_id: i32) -> GroupEditResult<GroupIds> {
        let rows = group_user::Entity::find()
            .filter(group_user::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        let groups: GroupIds = rows.into_iter().map(|row| row.group_id).collect();
        debug!(count = groups.len(), "user groups resolved");
        Ok(groups)
    }

    #[instrument(skip(self), level = "debug")]
    async fn groups_for_resource(&self, resource_id: i32) -> GroupEditResult<GroupIds> {
        let rows = group_resource::Entity::find()
            .filter(group_resource::Column::ResourceId.eq(resource_id))
            .all(&*self.db)
            .await?;
        let groups: GroupIds = rows.into_iter().map(|row| row.group_id).collect();
        debug!(count = groups.len(), "resource groups resolved");
        Ok(groups)
    }
}
