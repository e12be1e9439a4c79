//! Create-superuser command

use clap::Args;
use tracing::{info, warn};

use crate::config::{AppConfig, StorageBackend};
use crate::infrastructure::account::CreateAccountRequest;
use crate::infrastructure::logging::init_logging;

#[derive(Debug, Args)]
pub struct CreateSuperuserArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: Option<String>,

    /// Password; read from SUPERUSER_PASSWORD when omitted
    #[arg(long, env = "SUPERUSER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl CreateSuperuserArgs {
    fn into_request(self) -> CreateAccountRequest {
        CreateAccountRequest {
            username: self.username,
            password: self.password,
            email: self.email,
            ..Default::default()
        }
    }
}

pub async fn run(args: CreateSuperuserArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_logging(&config.logging);

    if config.storage.backend == StorageBackend::Memory {
        warn!("Storage backend is memory; the superuser will not outlive this process");
    }

    let state = crate::create_app_state_with_config(&config).await?;
    let account = state
        .account_service
        .create_superuser(args.into_request())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create superuser: {}", e))?;

    info!(user_id = %account.id(), username = %account.username(), "Superuser created");

    Ok(())
}
