pub use sea_orm_migration::prelude::*;

mod m20240101_000001_host_tables;
mod m20240101_000002_groups;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_host_tables::Migration),
            Box::new(m20240101_000002_groups::Migration),
        ]
    }
}
