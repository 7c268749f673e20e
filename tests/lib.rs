//! Fixtures for the end-to-end tests: a migrated in-memory database and
//! helpers to seed users, resources and group associations.

use anyhow::Result;
use chrono::Utc;
use entity::{group_resource, group_user, groups, resource, users};
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use sea_orm::{ActiveModelTrait, Set};

pub async fn migrated_db() -> Result<DbPool> {
    let settings = DatabaseSettings::default().with_url("sqlite::memory:");
    let db = connect(&settings).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn seed_user(db: &DbPool, email: &str, role: users::Role) -> Result<i32> {
    let model = users::ActiveModel {
        email: Set(email.to_string()),
        role: Set(role),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn seed_resource(
    db: &DbPool,
    owner_id: Option<i32>,
    resource_type: resource::ResourceType,
    title: &str,
) -> Result<i32> {
    let model = resource::ActiveModel {
        owner_id: Set(owner_id),
        resource_type: Set(resource_type),
        title: Set(Some(title.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn seed_group(db: &DbPool, name: &str) -> Result<i32> {
    let model = groups::ActiveModel {
        name: Set(name.to_string()),
        comment: Set(None),
        created: Set(Utc::now().into()),
        modified: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn add_member(db: &DbPool, group_id: i32, user_id: i32) -> Result<i32> {
    let model = group_user::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn assign_resource(db: &DbPool, group_id: i32, resource_id: i32) -> Result<i32> {
    let model = group_resource::ActiveModel {
        group_id: Set(group_id),
        resource_id: Set(resource_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}
