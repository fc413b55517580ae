use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240101_000001_create_lookup_tables::{Genres, Mpa};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Name))
                    .col(string_null(Films::Description))
                    .col(string(Films::ReleaseDate))
                    .col(integer(Films::Duration))
                    .col(integer_null(Films::MpaId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_mpa_id")
                            .from(Films::Table, Films::MpaId)
                            .to(Mpa::Table, Mpa::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmGenres::Table)
                    .if_not_exists()
                    .col(integer(FilmGenres::FilmId))
                    .col(integer(FilmGenres::GenreId))
                    .primary_key(Index::create().col(FilmGenres::FilmId).col(FilmGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_genres_film_id")
                            .from(FilmGenres::Table, FilmGenres::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_genres_genre_id")
                            .from(FilmGenres::Table, FilmGenres::GenreId)
                            .to(Genres::Table, Genres::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email))
                    .col(string(Users::Login))
                    .col(string(Users::Name))
                    .col(string_null(Users::Birthday))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmLikes::Table)
                    .if_not_exists()
                    .col(integer(FilmLikes::FilmId))
                    .col(integer(FilmLikes::UserId))
                    .primary_key(Index::create().col(FilmLikes::FilmId).col(FilmLikes::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_likes_film_id")
                            .from(FilmLikes::Table, FilmLikes::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_likes_user_id")
                            .from(FilmLikes::Table, FilmLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Friendships::Table)
                    .if_not_exists()
                    .col(integer(Friendships::UserId))
                    .col(integer(Friendships::FriendId))
                    .primary_key(
                        Index::create().col(Friendships::UserId).col(Friendships::FriendId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_user_id")
                            .from(Friendships::Table, Friendships::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_friend_id")
                            .from(Friendships::Table, Friendships::FriendId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_likes_film_id")
                    .table(FilmLikes::Table)
                    .col(FilmLikes::FilmId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Friendships::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmLikes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Name,
    Description,
    ReleaseDate,
    Duration,
    MpaId,
}

#[derive(DeriveIden)]
enum FilmGenres {
    Table,
    FilmId,
    GenreId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Login,
    Name,
    Birthday,
}

#[derive(DeriveIden)]
enum FilmLikes {
    Table,
    FilmId,
    UserId,
}

#[derive(DeriveIden)]
enum Friendships {
    Table,
    UserId,
    FriendId,
}
