use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resource")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub owner_id: Option<i32>,
    pub resource_type: ResourceType,
    pub title: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::group_resource::Entity")]
    GroupResource,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::group_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupResource.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ResourceType {
    #[sea_orm(string_value = "item")]
    Item,
    #[sea_orm(string_value = "item_set")]
    ItemSet,
    #[sea_orm(string_value = "media")]
    Media,
    #[sea_orm(string_value = "resource_template")]
    ResourceTemplate,
}

impl ActiveModelBehavior for ActiveModel {}
