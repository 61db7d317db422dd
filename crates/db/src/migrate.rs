//! Migration runner for module-contributed SQL

use bookstore_kernel::Migration;
use sqlx::{PgConnection, PgPool};

/// Advisory lock key shared by every process migrating the same database.
const MIGRATION_LOCK_KEY: i64 = 0x626f_6f6b_7374_6f72;

const LEDGER_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _bookstore_migrations (
        module TEXT NOT NULL,
        id TEXT NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (module, id)
    )
"#;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration '{module}/{id}' failed: {source}")]
    Apply {
        module: String,
        id: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration ledger error: {0}")]
    Ledger(#[from] sqlx::Error),
}

/// Held until the surrounding transaction ends.
async fn lock_ledger(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(conn)
        .await?;
    Ok(())
}

/// Apply every migration not yet recorded in the ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// The ledger check happens under an advisory lock inside that transaction,
/// so concurrent runners apply each migration once. Returns the number of
/// migrations applied.
pub async fn run_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> Result<usize, MigrationError> {
    let mut tx = pool.begin().await?;
    lock_ledger(&mut tx).await?;
    sqlx::raw_sql(LEDGER_TABLE_DDL).execute(&mut *tx).await?;
    tx.commit().await?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let mut tx = pool.begin().await?;
        lock_ledger(&mut tx).await?;

        let done: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM _bookstore_migrations WHERE module = $1 AND id = $2")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(&mut *tx)
                .await?;

        if done.is_some() {
            tx.rollback().await?;
            tracing::debug!(target: "bookstore-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let apply_err = |source| MigrationError::Apply {
            module: module.clone(),
            id: migration.id,
            source,
        };

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(apply_err)?;
        sqlx::query("INSERT INTO _bookstore_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "bookstore-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
