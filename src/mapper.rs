//! Row mapping from query results into domain entities.

use jiff::civil::Date;
use sea_orm::FromQueryResult;

use crate::{
    entities::user,
    error::AppResult,
    models::{Film, Mpa, User},
};

/// One row of `films LEFT JOIN mpa`.
#[derive(Clone, Debug, FromQueryResult)]
pub struct FilmRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub release_date: String,
    pub duration: i32,
    pub mpa_id: Option<i32>,
    pub mpa_name: Option<String>,
}

impl FilmRow {
    /// Genres live in their own table and are attached by the caller.
    pub fn into_film(self) -> AppResult<Film> {
        let mpa = match self.mpa_id {
            Some(id) if id != 0 => Some(Mpa { id, name: self.mpa_name.unwrap_or_default() }),
            _ => None,
        };
        Ok(Film {
            id: self.id,
            name: self.name,
            description: self.description,
            release_date: self.release_date.parse::<Date>()?,
            duration: self.duration,
            mpa,
            genres: Vec::new(),
        })
    }
}

impl TryFrom<user::Model> for User {
    type Error = crate::error::AppError;

    fn try_from(row: user::Model) -> AppResult<Self> {
        let birthday = row.birthday.map(|b| b.parse::<Date>()).transpose()?;
        Ok(User { id: row.id, email: row.email, login: row.login, name: row.name, birthday })
    }
}
