use anyhow::Context;
use bookstore_kernel::settings::{Environment, Settings};
use clap::{Parser, Subcommand};

/// Bookstore service command line
#[derive(Debug, Parser)]
#[command(name = "bookstore-cli", version, about)]
struct Cli {
    /// Override BOOKSTORE_ENV (local, test, staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the resolved settings as JSON, secrets redacted
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Resolve the environment first so its overlay file is layered in.
    let environment = cli.env.as_deref().map(Environment::parse).transpose()?;
    let settings =
        Settings::load_for(environment).with_context(|| "failed to load bookstore settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            bookstore_telemetry::init(&settings.telemetry)?;
            bookstore_app::run(settings).await
        }
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            let applied = bookstore_app::migrate(&settings).await?;
            tracing::info!(applied, database = settings.database_name(), "migrate finished");
            Ok(())
        }
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&serde_json::json!({
                "database_name": settings.database_name(),
                "settings": settings.redacted(),
            }))?;
            println!("{rendered}");
            Ok(())
        }
    }
}
