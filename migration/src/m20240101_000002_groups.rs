use sea_orm_migration::prelude::*;

use crate::m20240101_000001_host_tables::{Resource, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Name,
    Comment,
    Created,
    Modified,
}

#[derive(DeriveIden)]
enum GroupUser {
    Table,
    Id,
    UserId,
    GroupId,
}

#[derive(DeriveIden)]
enum GroupResource {
    Table,
    Id,
    ResourceId,
    GroupId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Groups::Name)
                            .string_len(190)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Groups::Comment).text())
                    .col(
                        ColumnDef::new(Groups::Created)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Groups::Modified).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupUser::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupUser::UserId).integer().not_null())
                    .col(ColumnDef::new(GroupUser::GroupId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_user_group")
                            .from(GroupUser::Table, GroupUser::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_user_user")
                            .from(GroupUser::Table, GroupUser::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_group_user")
                    .table(GroupUser::Table)
                    .col(GroupUser::GroupId)
                    .col(GroupUser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_user_user")
                    .table(GroupUser::Table)
                    .col(GroupUser::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupResource::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupResource::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupResource::ResourceId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupResource::GroupId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_resource_group")
                            .from(GroupResource::Table, GroupResource::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_resource_resource")
                            .from(GroupResource::Table, GroupResource::ResourceId)
                            .to(Resource::Table, Resource::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_group_resource")
                    .table(GroupResource::Table)
                    .col(GroupResource::GroupId)
                    .col(GroupResource::ResourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_resource_resource")
                    .table(GroupResource::Table)
                    .col(GroupResource::ResourceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(GroupResource::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(GroupUser::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).if_exists().to_owned())
            .await
    }
}
