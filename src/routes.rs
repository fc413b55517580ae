use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Film, FilmRequest, Genre, Mpa, PopularQuery, User, UserRequest},
};

/// `Json` that reports undecodable bodies as validation errors with the usual
/// error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/films", get(list_films).post(create_film).put(update_film))
        .route("/films/popular", get(popular_films))
        .route("/films/{id}", get(get_film).delete(delete_film))
        .route("/films/{id}/like/{user_id}", put(add_like).delete(remove_like))
        .route("/users", get(list_users).post(create_user).put(update_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/friends", get(friends))
        .route("/users/{id}/friends/{friend_id}", put(add_friend).delete(remove_friend))
        .route("/users/{id}/friends/common/{other_id}", get(common_friends))
        .route("/genres", get(list_genres))
        .route("/genres/{id}", get(get_genre))
        .route("/mpa", get(list_mpa))
        .route("/mpa/{id}", get(get_mpa))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any)),
        )
}

pub async fn list_films(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.films.all().await?))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.get(id).await?))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<FilmRequest>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.create(&req).await?))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<FilmRequest>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.update(&req).await?))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.films.delete(id).await?;
    Ok(StatusCode::OK)
}

pub async fn add_like(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.films.add_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.films.remove_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn popular_films(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PopularQuery>,
) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.films.popular(q.count).await?))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.all().await?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UserRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.create(&req).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UserRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(&req).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::OK)
}

pub async fn friends(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.friends(id).await?))
}

pub async fn add_friend(
    State(state): State<Arc<AppState>>,
    Path((id, friend_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.users.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Path((id, friend_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.users.remove_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn common_friends(
    State(state): State<Arc<AppState>>,
    Path((id, other_id)): Path<(i32, i32)>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.common_friends(id, other_id).await?))
}

pub async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.films.genres().await?))
}

pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.films.genre(id).await?))
}

pub async fn list_mpa(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Mpa>>> {
    Ok(Json(state.films.mpas().await?))
}

pub async fn get_mpa(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Mpa>> {
    Ok(Json(state.films.mpa(id).await?))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use super::*;
    use crate::{
        db,
        service::{FilmService, UserService},
        storage::{FilmStorage, UserStorage},
    };

    async fn setup_test_app() -> Router {
        let db = db::connect_in_memory().await.unwrap();
        let users = UserStorage::new(db.clone());
        let state = AppState {
            films: FilmService::new(FilmStorage::new(db), users.clone()),
            users: UserService::new(users),
        };
        router(Arc::new(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json =
            if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    fn film_body() -> Value {
        json!({
            "name": "Title",
            "description": "Description",
            "releaseDate": "2010-12-28",
            "duration": 3,
            "mpa": { "id": 3 },
            "genres": [{ "id": 1 }, { "id": 2 }]
        })
    }

    fn user_body(login: &str) -> Value {
        json!({
            "email": format!("{login}@example.com"),
            "login": login,
            "name": "",
            "birthday": "2000-01-01"
        })
    }

    #[tokio::test]
    async fn create_and_list_films() {
        let app = setup_test_app().await;

        let (status, film) = send(&app, Method::POST, "/films", Some(film_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(film["id"], 1);
        assert_eq!(film["releaseDate"], "2010-12-28");
        assert_eq!(film["mpa"], json!({ "id": 3, "name": "PG-13" }));
        assert_eq!(film["genres"][1], json!({ "id": 2, "name": "Drama" }));

        let (status, films) = send(&app, Method::GET, "/films", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(films.as_array().unwrap().len(), 1);
        assert_eq!(films[0], film);
    }

    #[tokio::test]
    async fn film_validation_errors_are_client_errors() {
        let app = setup_test_app().await;

        let cases = [
            (json!({ "name": " " }), StatusCode::UNPROCESSABLE_ENTITY),
            (json!({ "name": "Title", "description": "1".repeat(201) }), StatusCode::BAD_REQUEST),
            (
                json!({
                    "name": "Title",
                    "description": "Description",
                    "releaseDate": "1700-12-28"
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                json!({
                    "name": "Title",
                    "description": "Description",
                    "releaseDate": "2010-12-28",
                    "duration": -100
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (body, expected) in cases {
            let (status, error) = send(&app, Method::POST, "/films", Some(body.clone())).await;
            assert_eq!(status, expected, "{body}");
            assert!(error["message"].is_string());
        }

        let (_, films) = send(&app, Method::GET, "/films", None).await;
        assert_eq!(films, json!([]));
    }

    #[tokio::test]
    async fn undecodable_bodies_are_validation_errors() {
        let app = setup_test_app().await;

        let body = json!({ "name": "Title", "releaseDate": "2010-13-45", "duration": 5 });
        let (status, error) = send(&app, Method::POST, "/films", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation");

        let body = json!({ "email": "a@b", "login": "a", "birthday": "yesterday" });
        let (status, error) = send(&app, Method::POST, "/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation");

        let (status, error) = send(&app, Method::PUT, "/films", Some(json!({ "id": "one" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["message"].is_string());
    }

    #[tokio::test]
    async fn update_film_through_put() {
        let app = setup_test_app().await;
        send(&app, Method::POST, "/films", Some(film_body())).await;

        let (status, film) = send(
            &app,
            Method::PUT,
            "/films",
            Some(json!({ "id": 1, "name": "New title", "duration": 200 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(film["name"], "New title");
        assert_eq!(film["description"], "Description");
        assert_eq!(film["duration"], 200);

        let body = json!({ "id": 1, "name": "No duration" });
        let (status, _) = send(&app, Method::PUT, "/films", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, Method::PUT, "/films", Some(json!({ "id": 9, "duration": 10 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, film) = send(&app, Method::GET, "/films/1", None).await;
        assert_eq!(film["name"], "New title");
    }

    #[tokio::test]
    async fn user_rules_and_default_name() {
        let app = setup_test_app().await;

        let (status, user) = send(&app, Method::POST, "/users", Some(user_body("login"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["name"], "login");

        for body in [
            json!({ "email": " ", "login": "login", "birthday": "2000-01-01" }),
            json!({ "email": "mail@", "login": " ", "birthday": "2000-01-01" }),
            json!({ "email": "mail@", "login": "login", "birthday": "3000-01-01" }),
        ] {
            let (status, error) = send(&app, Method::POST, "/users", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error["error"], "validation");
        }

        let (status, users) = send(&app, Method::GET, "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn likes_drive_popular_films() {
        let app = setup_test_app().await;
        send(&app, Method::POST, "/films", Some(film_body())).await;
        send(&app, Method::POST, "/films", Some(film_body())).await;
        send(&app, Method::POST, "/users", Some(user_body("fan"))).await;

        let (status, _) = send(&app, Method::PUT, "/films/2/like/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, popular) = send(&app, Method::GET, "/films/popular?count=1", None).await;
        assert_eq!(popular.as_array().unwrap().len(), 1);
        assert_eq!(popular[0]["id"], 2);

        let (status, _) = send(&app, Method::PUT, "/films/2/like/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/films/2/like/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn friends_and_common_friends() {
        let app = setup_test_app().await;
        for login in ["a", "b", "c"] {
            send(&app, Method::POST, "/users", Some(user_body(login))).await;
        }

        send(&app, Method::PUT, "/users/1/friends/3", None).await;
        send(&app, Method::PUT, "/users/2/friends/3", None).await;

        let (status, friends) = send(&app, Method::GET, "/users/1/friends", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(friends[0]["login"], "c");

        let (_, common) = send(&app, Method::GET, "/users/1/friends/common/2", None).await;
        assert_eq!(common.as_array().unwrap().len(), 1);
        assert_eq!(common[0]["id"], 3);

        let (status, _) = send(&app, Method::DELETE, "/users/1/friends/3", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, friends) = send(&app, Method::GET, "/users/1/friends", None).await;
        assert_eq!(friends, json!([]));
    }

    #[tokio::test]
    async fn lookup_endpoints() {
        let app = setup_test_app().await;

        let (status, genres) = send(&app, Method::GET, "/genres", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(genres.as_array().unwrap().len(), 6);

        let (_, mpa) = send(&app, Method::GET, "/mpa/5", None).await;
        assert_eq!(mpa, json!({ "id": 5, "name": "NC-17" }));

        let (status, _) = send(&app, Method::GET, "/genres/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_film_then_not_found() {
        let app = setup_test_app().await;
        send(&app, Method::POST, "/films", Some(film_body())).await;

        let (status, _) = send(&app, Method::DELETE, "/films/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, error) = send(&app, Method::GET, "/films/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "not_found");
    }
}
