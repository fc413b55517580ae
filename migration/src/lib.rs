pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_lookup_tables;
mod m20240101_000002_create_films_and_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_lookup_tables::Migration),
            Box::new(m20240101_000002_create_films_and_users::Migration),
        ]
    }
}
