mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod mapper;
mod models;
mod routes;
mod service;
mod storage;
mod validation;

use std::sync::Arc;

use crate::{
    config::Config,
    service::{FilmService, UserService},
    storage::{FilmStorage, UserStorage},
};

pub struct AppState {
    pub films: FilmService,
    pub users: UserService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmorate=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url, config.db_max_connections).await?;
    let users = UserStorage::new(db.clone());
    let state = Arc::new(AppState {
        films: FilmService::new(FilmStorage::new(db), users.clone()),
        users: UserService::new(users),
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
