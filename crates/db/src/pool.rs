//! Database connection pool management

use bookstore_kernel::settings::Settings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Build connect options from settings.
///
/// A host starting with `/` is a unix socket directory.
pub fn connect_options(settings: &Settings) -> PgConnectOptions {
    let db = &settings.database;
    let mut options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .database(settings.database_name());

    if let Some(username) = &db.username {
        options = options.username(username);
    }
    if let Some(password) = &db.password {
        options = options.password(password);
    }

    options
}

/// Open the pool and verify that a connection can be established.
///
/// # Errors
///
/// Returns an error if the first connection fails.
pub async fn connect(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        target: "bookstore-db",
        host = %settings.database.host,
        database = settings.database_name(),
        max_connections = settings.database.max_connections,
        "connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_with(connect_options(settings))
        .await
}
