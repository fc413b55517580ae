mod films;
mod users;

pub use films::FilmStorage;
pub use users::UserStorage;
