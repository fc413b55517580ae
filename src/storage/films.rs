use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use crate::{
    catalog,
    entities::{film, film_genre, film_like, genre, mpa},
    error::AppResult,
    mapper::FilmRow,
    models::{Film, Genre, Mpa},
};

#[derive(Clone)]
pub struct FilmStorage {
    db: DatabaseConnection,
}

impl FilmStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> AppResult<Vec<Film>> {
        let rows = select_films()
            .order_by_asc(film::Column::Id)
            .into_model::<FilmRow>()
            .all(&self.db)
            .await?;
        self.with_genres(rows).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Option<Film>> {
        let row = select_films()
            .filter(film::Column::Id.eq(id))
            .into_model::<FilmRow>()
            .one(&self.db)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_genres(vec![row]).await?.pop())
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(film::Entity::find_by_id(id).one(&self.db).await?.is_some())
    }

    /// Stores `film` with a fresh id, which the returned copy carries.
    pub async fn insert(&self, film: &Film) -> AppResult<Film> {
        let txn = self.db.begin().await?;

        let model = film::ActiveModel {
            id: Default::default(),
            name: Set(film.name.clone()),
            description: Set(film.description.clone()),
            release_date: Set(film.release_date.to_string()),
            duration: Set(film.duration),
            mpa_id: Set(film.mpa.as_ref().map(|m| m.id)),
        };
        let id = film::Entity::insert(model).exec(&txn).await?.last_insert_id;
        write_genres(&txn, id, &film.genres).await?;

        txn.commit().await?;

        Ok(Film { id, ..film.clone() })
    }

    /// Returns `false` when no film had this id.
    pub async fn update(&self, film: &Film) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let model = film::ActiveModel {
            id: Set(film.id),
            name: Set(film.name.clone()),
            description: Set(film.description.clone()),
            release_date: Set(film.release_date.to_string()),
            duration: Set(film.duration),
            mpa_id: Set(film.mpa.as_ref().map(|m| m.id)),
        };
        match film::Entity::update(model).exec(&txn).await {
            Err(DbErr::RecordNotUpdated) => return Ok(false),
            res => res?,
        };
        write_genres(&txn, film.id, &film.genres).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Returns `false` when no film had this id.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        film_genre::Entity::delete_many()
            .filter(film_genre::Column::FilmId.eq(id))
            .exec(&txn)
            .await?;
        film_like::Entity::delete_many()
            .filter(film_like::Column::FilmId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = film::Entity::delete_by_id(id).exec(&txn).await?.rows_affected;

        txn.commit().await?;
        Ok(deleted > 0)
    }

    /// Liking twice is a no-op.
    pub async fn add_like(&self, film_id: i32, user_id: i32) -> AppResult<()> {
        let model = film_like::ActiveModel { film_id: Set(film_id), user_id: Set(user_id) };
        film_like::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([film_like::Column::FilmId, film_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn remove_like(&self, film_id: i32, user_id: i32) -> AppResult<bool> {
        let res = film_like::Entity::delete_many()
            .filter(film_like::Column::FilmId.eq(film_id))
            .filter(film_like::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Most liked first; ties go to the lower id.
    pub async fn popular(&self, count: u64) -> AppResult<Vec<Film>> {
        let rows = select_films()
            .join(JoinType::LeftJoin, film::Relation::FilmLike.def())
            .group_by(film::Column::Id)
            .order_by_desc(Expr::col((film_like::Entity, film_like::Column::UserId)).count())
            .order_by_asc(film::Column::Id)
            .limit(count)
            .into_model::<FilmRow>()
            .all(&self.db)
            .await?;
        self.with_genres(rows).await
    }

    pub async fn genres(&self) -> AppResult<Vec<Genre>> {
        let rows = genre::Entity::find().order_by_asc(genre::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(|g| Genre { id: g.id, name: g.name }).collect())
    }

    pub async fn genre(&self, id: i32) -> AppResult<Option<Genre>> {
        let row = genre::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(|g| Genre { id: g.id, name: g.name }))
    }

    pub async fn mpas(&self) -> AppResult<Vec<Mpa>> {
        let rows = mpa::Entity::find().order_by_asc(mpa::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(|m| Mpa { id: m.id, name: m.name }).collect())
    }

    pub async fn mpa(&self, id: i32) -> AppResult<Option<Mpa>> {
        let row = mpa::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(|m| Mpa { id: m.id, name: m.name }))
    }

    async fn with_genres(&self, rows: Vec<FilmRow>) -> AppResult<Vec<Film>> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut by_film: HashMap<i32, Vec<Genre>> = HashMap::new();

        if !ids.is_empty() {
            let links = film_genre::Entity::find()
                .filter(film_genre::Column::FilmId.is_in(ids))
                .order_by_asc(film_genre::Column::GenreId)
                .all(&self.db)
                .await?;
            for link in links {
                if let Some(genre) = catalog::genre(link.genre_id) {
                    by_film.entry(link.film_id).or_default().push(genre);
                }
            }
        }

        rows.into_iter()
            .map(|row| -> AppResult<Film> {
                let mut film = row.into_film()?;
                film.genres = by_film.remove(&film.id).unwrap_or_default();
                Ok(film)
            })
            .collect()
    }
}

fn select_films() -> Select<film::Entity> {
    film::Entity::find()
        .select_only()
        .columns([
            film::Column::Id,
            film::Column::Name,
            film::Column::Description,
            film::Column::ReleaseDate,
            film::Column::Duration,
            film::Column::MpaId,
        ])
        .column_as(mpa::Column::Name, "mpa_name")
        .left_join(mpa::Entity)
}

async fn write_genres<C: ConnectionTrait>(db: &C, film_id: i32, genres: &[Genre]) -> AppResult<()> {
    film_genre::Entity::delete_many()
        .filter(film_genre::Column::FilmId.eq(film_id))
        .exec(db)
        .await?;

    if genres.is_empty() {
        return Ok(());
    }
    let links = genres
        .iter()
        .map(|g| film_genre::ActiveModel { film_id: Set(film_id), genre_id: Set(g.id) });
    film_genre::Entity::insert_many(links).exec_without_returning(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::{db, models::User, storage::UserStorage};

    fn film(name: &str) -> Film {
        Film {
            id: 0,
            name: name.to_string(),
            description: Some("About".to_string()),
            release_date: date(2001, 9, 14),
            duration: 100,
            mpa: catalog::mpa(2),
            genres: vec![catalog::genre(1).unwrap(), catalog::genre(4).unwrap()],
        }
    }

    async fn user(users: &UserStorage, login: &str) -> i32 {
        let user = User {
            id: 0,
            email: format!("{login}@example.com"),
            login: login.to_string(),
            name: login.to_string(),
            birthday: None,
        };
        users.insert(&user).await.unwrap().id
    }

    #[tokio::test]
    async fn insert_then_read_back_with_rating_and_genres() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());

        let stored = storage.insert(&film("First")).await.unwrap();
        assert!(stored.id > 0);

        let loaded = storage.get(stored.id).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.mpa.unwrap().name, "PG");
        assert_eq!(storage.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn film_without_rating_reads_back_unset() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());

        let plain = Film { mpa: None, genres: vec![], ..film("Plain") };
        let stored = storage.insert(&plain).await.unwrap();

        let loaded = storage.get(stored.id).await.unwrap().unwrap();
        assert_eq!(loaded.mpa, None);
        assert!(loaded.genres.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_fields_and_genres() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());
        let mut stored = storage.insert(&film("Before")).await.unwrap();

        stored.name = "After".to_string();
        stored.mpa = None;
        stored.genres = vec![catalog::genre(6).unwrap()];
        assert!(storage.update(&stored).await.unwrap());

        let loaded = storage.get(stored.id).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn update_of_vanished_film_reports_false() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());
        let stored = storage.insert(&film("Gone")).await.unwrap();
        storage.delete(stored.id).await.unwrap();

        assert!(!storage.update(&stored).await.unwrap());
        assert_eq!(storage.get(stored.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_whether_film_existed() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());
        let stored = storage.insert(&film("Doomed")).await.unwrap();

        assert!(storage.delete(stored.id).await.unwrap());
        assert!(!storage.delete(stored.id).await.unwrap());
        assert_eq!(storage.get(stored.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn popular_orders_by_likes_then_id() {
        let db = db::connect_in_memory().await.unwrap();
        let storage = FilmStorage::new(db.clone());
        let users = UserStorage::new(db);

        let a = storage.insert(&film("A")).await.unwrap().id;
        let b = storage.insert(&film("B")).await.unwrap().id;
        let c = storage.insert(&film("C")).await.unwrap().id;
        let u1 = user(&users, "one").await;
        let u2 = user(&users, "two").await;

        storage.add_like(c, u1).await.unwrap();
        storage.add_like(c, u2).await.unwrap();
        storage.add_like(c, u2).await.unwrap();
        storage.add_like(b, u1).await.unwrap();

        let ids: Vec<i32> = storage.popular(10).await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, [c, b, a]);

        let ids: Vec<i32> = storage.popular(1).await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, [c]);

        assert!(storage.remove_like(c, u1).await.unwrap());
        assert!(storage.remove_like(c, u2).await.unwrap());
        assert!(!storage.remove_like(c, u2).await.unwrap());
        let ids: Vec<i32> = storage.popular(10).await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, [b, a, c]);
    }

    #[tokio::test]
    async fn lookup_tables_are_seeded() {
        let storage = FilmStorage::new(db::connect_in_memory().await.unwrap());

        let genres = storage.genres().await.unwrap();
        assert_eq!(genres.len(), 6);
        assert_eq!(genres, (1..=6).filter_map(catalog::genre).collect::<Vec<_>>());

        let mpas = storage.mpas().await.unwrap();
        assert_eq!(mpas, (1..=5).filter_map(catalog::mpa).collect::<Vec<_>>());

        assert_eq!(storage.mpa(5).await.unwrap().map(|m| m.name).as_deref(), Some("NC-17"));
        assert_eq!(storage.genre(7).await.unwrap(), None);
    }
}
