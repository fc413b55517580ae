use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection,
    sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous},
};

use crate::error::AppResult;

/// Opens the pool and migrates. The SQLite settings are part of the connect
/// options, so every pooled connection gets them when it is opened.
pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(max_connections).sqlx_logging(false).map_sqlx_sqlite_opts(|o| {
        o.journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
    });
    let db = Database::connect(opts).await?;

    Migrator::up(&db, None).await?;
    tracing::debug!("database migrated");
    Ok(db)
}

/// Fresh, fully migrated database that lives as long as its single connection.
#[cfg(test)]
pub async fn connect_in_memory() -> AppResult<DatabaseConnection> {
    connect_and_migrate("sqlite::memory:", 1).await
}
