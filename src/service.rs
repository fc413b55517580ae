use jiff::{Zoned, civil::Date};
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{Film, FilmRequest, Genre, Mpa, User, UserRequest},
    storage::{FilmStorage, UserStorage},
    validation,
};

pub const DEFAULT_POPULAR_COUNT: i64 = 10;

#[derive(Clone)]
pub struct FilmService {
    films: FilmStorage,
    users: UserStorage,
}

impl FilmService {
    pub fn new(films: FilmStorage, users: UserStorage) -> Self {
        Self { films, users }
    }

    pub async fn all(&self) -> AppResult<Vec<Film>> {
        let films = self.films.all().await?;
        debug!(count = films.len(), "listed films");
        Ok(films)
    }

    pub async fn get(&self, id: i32) -> AppResult<Film> {
        self.films.get(id).await?.ok_or_else(|| film_not_found(id))
    }

    pub async fn create(&self, req: &FilmRequest) -> AppResult<Film> {
        let film = validation::new_film(req)?;
        let film = self.films.insert(&film).await?;
        info!(id = film.id, name = %film.name, "film created");
        Ok(film)
    }

    /// Loads the film named by `req.id`, applies the present fields and
    /// persists the result only if every field passed.
    pub async fn update(&self, req: &FilmRequest) -> AppResult<Film> {
        let Some(id) = req.id else {
            warn!("film update without id");
            return Err(AppError::conditions_not_met("film id must be given"));
        };
        let mut film = self.get(id).await?;
        validation::apply_film_update(&mut film, req)?;
        if !self.films.update(&film).await? {
            return Err(film_not_found(id));
        }
        info!(id, "film updated");
        Ok(film)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.films.delete(id).await? {
            return Err(film_not_found(id));
        }
        info!(id, "film deleted");
        Ok(())
    }

    pub async fn add_like(&self, film_id: i32, user_id: i32) -> AppResult<()> {
        self.ensure_film_and_user(film_id, user_id).await?;
        self.films.add_like(film_id, user_id).await?;
        info!(film_id, user_id, "like added");
        Ok(())
    }

    pub async fn remove_like(&self, film_id: i32, user_id: i32) -> AppResult<()> {
        self.ensure_film_and_user(film_id, user_id).await?;
        if !self.films.remove_like(film_id, user_id).await? {
            return Err(AppError::not_found(format!(
                "user {user_id} has not liked film {film_id}"
            )));
        }
        info!(film_id, user_id, "like removed");
        Ok(())
    }

    pub async fn popular(&self, count: Option<i64>) -> AppResult<Vec<Film>> {
        let count = count.unwrap_or(DEFAULT_POPULAR_COUNT);
        if count <= 0 {
            warn!(count, "popular count not positive");
            return Err(AppError::validation("count must be a positive number"));
        }
        self.films.popular(count as u64).await
    }

    pub async fn genres(&self) -> AppResult<Vec<Genre>> {
        self.films.genres().await
    }

    pub async fn genre(&self, id: i32) -> AppResult<Genre> {
        self.films
            .genre(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("genre {id} not found")))
    }

    pub async fn mpas(&self) -> AppResult<Vec<Mpa>> {
        self.films.mpas().await
    }

    pub async fn mpa(&self, id: i32) -> AppResult<Mpa> {
        self.films
            .mpa(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("rating {id} not found")))
    }

    async fn ensure_film_and_user(&self, film_id: i32, user_id: i32) -> AppResult<()> {
        if !self.films.exists(film_id).await? {
            return Err(film_not_found(film_id));
        }
        if !self.users.exists(user_id).await? {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserService {
    users: UserStorage,
}

impl UserService {
    pub fn new(users: UserStorage) -> Self {
        Self { users }
    }

    pub async fn all(&self) -> AppResult<Vec<User>> {
        let users = self.users.all().await?;
        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.users.get(id).await?.ok_or_else(|| user_not_found(id))
    }

    pub async fn create(&self, req: &UserRequest) -> AppResult<User> {
        let user = validation::new_user(req, today())?;
        let user = self.users.insert(&user).await?;
        info!(id = user.id, login = %user.login, "user created");
        Ok(user)
    }

    pub async fn update(&self, req: &UserRequest) -> AppResult<User> {
        let Some(id) = req.id else {
            warn!("user update without id");
            return Err(AppError::conditions_not_met("user id must be given"));
        };
        let mut user = self.get(id).await?;
        validation::apply_user_update(&mut user, req, today())?;
        if !self.users.update(&user).await? {
            return Err(user_not_found(id));
        }
        info!(id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.users.delete(id).await? {
            return Err(user_not_found(id));
        }
        info!(id, "user deleted");
        Ok(())
    }

    pub async fn add_friend(&self, id: i32, friend_id: i32) -> AppResult<()> {
        if id == friend_id {
            warn!(id, "user tried to befriend themselves");
            return Err(AppError::validation("a user cannot befriend themselves"));
        }
        self.ensure_exists(id).await?;
        self.ensure_exists(friend_id).await?;
        self.users.add_friend(id, friend_id).await?;
        info!(id, friend_id, "friend added");
        Ok(())
    }

    /// Removing someone who is not a friend is not an error.
    pub async fn remove_friend(&self, id: i32, friend_id: i32) -> AppResult<()> {
        self.ensure_exists(id).await?;
        self.ensure_exists(friend_id).await?;
        if self.users.remove_friend(id, friend_id).await? {
            info!(id, friend_id, "friend removed");
        }
        Ok(())
    }

    pub async fn friends(&self, id: i32) -> AppResult<Vec<User>> {
        self.ensure_exists(id).await?;
        self.users.friends(id).await
    }

    pub async fn common_friends(&self, id: i32, other_id: i32) -> AppResult<Vec<User>> {
        self.ensure_exists(id).await?;
        self.ensure_exists(other_id).await?;
        self.users.common_friends(id, other_id).await
    }

    async fn ensure_exists(&self, id: i32) -> AppResult<()> {
        if !self.users.exists(id).await? {
            return Err(user_not_found(id));
        }
        Ok(())
    }
}

fn today() -> Date {
    Zoned::now().date()
}

fn film_not_found(id: i32) -> AppError {
    AppError::not_found(format!("film {id} not found"))
}

fn user_not_found(id: i32) -> AppError {
    AppError::not_found(format!("user {id} not found"))
}
