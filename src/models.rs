use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Motion Picture Association rating.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Mpa {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub release_date: Date,
    /// Minutes.
    pub duration: i32,
    pub mpa: Option<Mpa>,
    pub genres: Vec<Genre>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: Option<Date>,
}

/// Reference to a lookup-table row by id. Any name sent alongside is ignored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub struct Reference {
    pub id: i32,
}

/// Body of `POST /films` and `PUT /films`. Every field is optional so the same
/// payload drives both creation and partial update.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<Date>,
    pub duration: Option<i32>,
    pub mpa: Option<Reference>,
    pub genres: Option<Vec<Reference>>,
}

impl FilmRequest {
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Body of `POST /users` and `PUT /users`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserRequest {
    pub id: Option<i32>,
    pub email: Option<String>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub count: Option<i64>,
}
