//! Migrate command - applies or reverts the account schema

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::migrations::PostgresMigrator;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_logging(&config.logging);

    let pool = crate::connect_database(&config).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.revert {
        match migrator.revert_last().await? {
            Some(version) => info!("Reverted migration {}", version),
            None => info!("No applied migrations to revert"),
        }
    } else {
        let applied = migrator.run().await?;
        info!("Applied {} migration(s)", applied);
    }

    Ok(())
}
