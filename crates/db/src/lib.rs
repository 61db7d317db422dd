//! PostgreSQL access for the bookstore service.
//!
//! - Bounded `PgPool`, opened at startup and closed on shutdown
//! - Database name chosen by the environment (`books` / `books_test`)
//! - Module migrations applied once per database, tracked in a ledger table

pub mod migrate;
pub mod pool;

pub use migrate::{run_migrations, MigrationError};
pub use pool::{connect, connect_options};
