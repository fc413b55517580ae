//! Fixed lookup tables for genres and MPA ratings.
//!
//! The same rows are seeded into the `genres` and `mpa` tables by the
//! migration crate; these tables resolve request references without a
//! round trip to the database.

use crate::models::{Genre, Mpa};

const GENRES: [(i32, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

const MPA_RATINGS: [(i32, &str); 5] = [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

pub fn genre(id: i32) -> Option<Genre> {
    GENRES
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(code, name)| Genre { id: *code, name: (*name).to_string() })
}

pub fn mpa(id: i32) -> Option<Mpa> {
    MPA_RATINGS
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(code, name)| Mpa { id: *code, name: (*name).to_string() })
}
