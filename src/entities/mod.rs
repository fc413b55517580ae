pub mod film;
pub mod film_genre;
pub mod film_like;
pub mod friendship;
pub mod genre;
pub mod mpa;
pub mod user;
