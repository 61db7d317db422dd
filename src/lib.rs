//! Bookstore application library
//!
//! Wires the books module into the kernel registry and drives the service
//! lifecycle: connect, migrate, start, serve, stop.

pub mod modules;

use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry with every service module registered
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Run the HTTP service until a shutdown signal arrives.
///
/// Failing to reach the database is fatal.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = bookstore_db::connect(&settings)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.database_name()))?;

    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };

    registry.init_modules(&ctx).await?;
    apply_migrations(&registry, &pool).await?;
    registry.start_modules(&ctx).await?;

    let served = bookstore_http::start_server(&registry, &ctx).await;

    registry.stop_modules().await?;
    pool.close().await;
    tracing::info!("database pool closed");

    served
}

/// Connect, apply pending migrations and return how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = bookstore_db::connect(settings)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.database_name()))?;

    let applied = apply_migrations(&registry(), &pool).await;
    pool.close().await;
    applied
}

async fn apply_migrations(registry: &ModuleRegistry, pool: &sqlx::PgPool) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = bookstore_db::run_migrations(pool, &migrations)
        .await
        .context("failed to apply migrations")?;

    tracing::info!(
        applied,
        total = migrations.len(),
        "migrations complete"
    );
    Ok(applied)
}
