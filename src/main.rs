use agora::{settings, web};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "agora", version, about = "Discussion forum server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database)
    let db = sea_orm::Database::connect(&settings.database.url)
        .await
        .into_diagnostic()?;
    migration::Migrator::up(&db, None).await.into_diagnostic()?;

    // start web server; admin permissions are reconciled before it binds
    web::serve(settings, db).await?;
    Ok(())
}
