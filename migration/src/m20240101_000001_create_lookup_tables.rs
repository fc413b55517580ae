use sea_orm_migration::{prelude::*, schema::*};

const MPA_ROWS: [(i32, &str); 5] = [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

const GENRE_ROWS: [(i32, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mpa::Table)
                    .if_not_exists()
                    .col(integer(Mpa::Id).primary_key())
                    .col(string(Mpa::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(integer(Genres::Id).primary_key())
                    .col(string(Genres::Name))
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert.into_table(Mpa::Table).columns([Mpa::Id, Mpa::Name]);
        for (id, name) in MPA_ROWS {
            insert.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(insert).await?;

        let mut insert = Query::insert();
        insert.into_table(Genres::Table).columns([Genres::Id, Genres::Name]);
        for (id, name) in GENRE_ROWS {
            insert.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Mpa::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Mpa {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub enum Genres {
    Table,
    Id,
    Name,
}
