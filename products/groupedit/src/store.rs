//! Loads users and resources into their request-scoped wrappers.

use entity::{resource, users};
use platform_authz::ResourceKind;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    error::{GroupEditError, GroupEditResult},
    model::{GroupedResource, GroupedUser, Identity, ResourceRef, kind_to_entity},
};

pub async fn load_user(db: &DatabaseConnection, user_id: i32) -> GroupEditResult<GroupedUser> {
    let model = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(GroupEditError::UserNotFound(user_id))?;
    Ok(GroupedUser::new(Identity::from(&model)))
}

pub async fn load_resource(
    db: &DatabaseConnection,
    resource_id: i32,
) -> GroupEditResult<GroupedResource> {
    let model = resource::Entity::find_by_id(resource_id)
        .one(db)
        .await?
        .ok_or(GroupEditError::ResourceNotFound(resource_id))?;
    Ok(GroupedResource::new(ResourceRef::from(&model)))
}

/// Resources ordered by id, optionally restricted to one kind.
pub async fn search_resources(
    db: &DatabaseConnection,
    kind: Option<ResourceKind>,
    limit: u64,
) -> GroupEditResult<Vec<GroupedResource>> {
    let mut query = resource::Entity::find();
    if let Some(kind) = kind {
        query = query.filter(resource::Column::ResourceType.eq(kind_to_entity(kind)?));
    }
    let rows = query
        .order_by_asc(resource::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(rows
        .iter()
        .map(|model| GroupedResource::new(ResourceRef::from(model)))
        .collect())
}
