use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/famdash.db)
  PORT        (default: 5252 or config.listen_port)
  RUST_LOG    (default: info)

Maintenance commands use the same config and database as the server.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "famdash-server",
    version,
    about = "Family dashboard server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete expired PIN sessions and audit entries past retention
    Prune {
        /// Override `audit_retention_days` from the config
        #[arg(long)]
        retention_days: Option<u32>,
    },
    /// Remove the household PIN and every session (offline recovery)
    ResetPin {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}
