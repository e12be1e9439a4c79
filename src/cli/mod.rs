//! CLI module for the account service
//!
//! Provides subcommands:
//! - `serve`: HTTP API server (default deployment mode)
//! - `migrate`: apply or revert the account schema
//! - `create-superuser`: create a privileged account

pub mod create_superuser;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Account Service - user identity, tokens and account administration
#[derive(Parser)]
#[command(name = "account-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending schema migrations
    Migrate(migrate::MigrateArgs),

    /// Create an account with staff and superuser rights
    CreateSuperuser(create_superuser::CreateSuperuserArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_optional() {
        let cli = Cli::try_parse_from(["account-service"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_create_superuser() {
        let cli = Cli::try_parse_from([
            "account-service",
            "create-superuser",
            "--username",
            "root",
            "--email",
            "root@example.com",
        ])
        .unwrap();

        match cli.command {
            Some(Command::CreateSuperuser(args)) => {
                assert_eq!(args.username, "root");
                assert_eq!(args.email.as_deref(), Some("root@example.com"));
            }
            _ => panic!("expected create-superuser"),
        }
    }

    #[test]
    fn test_parse_migrate_revert() {
        let cli = Cli::try_parse_from(["account-service", "migrate", "--revert"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Migrate(migrate::MigrateArgs { revert: true }))
        ));
    }
}
