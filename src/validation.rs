//! Field rules for films and users, and the partial-update routines that
//! apply a request payload onto a stored entity.

use jiff::civil::{Date, date};
use tracing::warn;

use crate::{
    catalog,
    error::{AppError, AppResult},
    models::{Film, FilmRequest, Genre, Reference, User, UserRequest},
};

pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// The first public film screening.
pub const EARLIEST_RELEASE_DATE: Date = date(1895, 12, 28);

pub fn check_description(description: &str) -> AppResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        warn!(length = description.chars().count(), "film description too long");
        return Err(AppError::validation(format!(
            "maximum description length is {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn check_release_date(release_date: Date) -> AppResult<()> {
    if release_date < EARLIEST_RELEASE_DATE {
        warn!(%release_date, "film release date too early");
        return Err(AppError::validation(format!(
            "release date must not be earlier than {EARLIEST_RELEASE_DATE}"
        )));
    }
    Ok(())
}

pub fn check_duration(duration: Option<i32>) -> AppResult<i32> {
    match duration {
        Some(d) if d > 0 => Ok(d),
        _ => {
            warn!(?duration, "film duration not positive");
            Err(AppError::validation("duration must be a positive number"))
        },
    }
}

/// Overwrites the fields present in `req`, checking each one just before it
/// is written. A failure leaves earlier writes in place on `film`, so callers
/// must only persist on `Ok`.
///
/// Duration is the one mandatory field: a missing or non-positive duration
/// fails even when everything else is absent.
pub fn apply_film_update(film: &mut Film, req: &FilmRequest) -> AppResult<()> {
    if req.has_name() {
        film.name = req.name.clone().unwrap_or_default();
    }
    if req.has_description() {
        let description = req.description.as_deref().unwrap_or_default();
        check_description(description)?;
        film.description = Some(description.to_string());
    }
    if let Some(mpa) = req.mpa {
        film.mpa = catalog::mpa(mpa.id);
    }
    if let Some(release_date) = req.release_date {
        check_release_date(release_date)?;
        film.release_date = release_date;
    }
    film.duration = check_duration(req.duration)?;
    if let Some(genres) = &req.genres {
        film.genres = resolve_genres(genres);
    }
    Ok(())
}

/// Builds a new, not yet persisted film (`id` 0) from a creation payload.
pub fn new_film(req: &FilmRequest) -> AppResult<Film> {
    let name = match req.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            warn!("film name missing");
            return Err(AppError::conditions_not_met("film name must not be blank"));
        },
    };
    if req.has_description() {
        check_description(req.description.as_deref().unwrap_or_default())?;
    }
    let Some(release_date) = req.release_date else {
        warn!("film release date missing");
        return Err(AppError::validation("release date is required"));
    };

    let mut film = Film {
        id: 0,
        name,
        description: None,
        release_date,
        duration: 0,
        mpa: None,
        genres: Vec::new(),
    };
    apply_film_update(&mut film, req)?;
    Ok(film)
}

/// Unknown codes are dropped; the result is ordered by id without repeats.
fn resolve_genres(refs: &[Reference]) -> Vec<Genre> {
    let mut genres: Vec<Genre> = refs.iter().filter_map(|r| catalog::genre(r.id)).collect();
    genres.sort_by_key(|g| g.id);
    genres.dedup_by_key(|g| g.id);
    genres
}

pub fn check_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        warn!("user email blank");
        return Err(AppError::validation("email must not be blank"));
    }
    if !email.contains('@') {
        warn!(email, "user email without @");
        return Err(AppError::validation("email must contain '@'"));
    }
    Ok(())
}

pub fn check_login(login: &str) -> AppResult<()> {
    if login.trim().is_empty() {
        warn!("user login blank");
        return Err(AppError::validation("login must not be blank"));
    }
    if login.chars().any(char::is_whitespace) {
        warn!(login, "user login contains whitespace");
        return Err(AppError::validation("login must not contain spaces"));
    }
    Ok(())
}

pub fn check_birthday(birthday: Date, today: Date) -> AppResult<()> {
    if birthday > today {
        warn!(%birthday, "user birthday in the future");
        return Err(AppError::validation("birthday must not be in the future"));
    }
    Ok(())
}

/// Builds a new, not yet persisted user (`id` 0). `today` bounds the birthday.
pub fn new_user(req: &UserRequest, today: Date) -> AppResult<User> {
    let email = req.email.clone().unwrap_or_default();
    check_email(&email)?;
    let login = req.login.clone().unwrap_or_default();
    check_login(&login)?;
    if let Some(birthday) = req.birthday {
        check_birthday(birthday, today)?;
    }

    let mut user = User {
        id: 0,
        email,
        login,
        name: req.name.clone().unwrap_or_default(),
        birthday: req.birthday,
    };
    default_name(&mut user);
    Ok(user)
}

/// Partial update for users, with the same write-as-you-go semantics as
/// [`apply_film_update`].
pub fn apply_user_update(user: &mut User, req: &UserRequest, today: Date) -> AppResult<()> {
    if let Some(email) = &req.email {
        check_email(email)?;
        user.email = email.clone();
    }
    if let Some(login) = &req.login {
        check_login(login)?;
        user.login = login.clone();
    }
    if let Some(name) = &req.name {
        user.name = name.clone();
    }
    if let Some(birthday) = req.birthday {
        check_birthday(birthday, today)?;
        user.birthday = Some(birthday);
    }
    default_name(user);
    Ok(())
}

fn default_name(user: &mut User) {
    if user.name.trim().is_empty() {
        user.name = user.login.clone();
    }
}
