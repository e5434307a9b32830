use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DATABASE_BACKEND, ENV_HOST, ENV_PORT, ENV_POSTGRES_URL, ENV_SQLITE_PATH,
};
use crate::data::sql::Backend;

#[derive(Parser)]
#[command(name = "restquery")]
#[command(version, about = "Query-string driven REST API over SQL tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    // Database options
    /// Database backend (sqlite or postgres)
    #[arg(long, global = true, env = ENV_DATABASE_BACKEND, value_parser = parse_database_backend)]
    pub database_backend: Option<Backend>,

    /// SQLite database file (or :memory:)
    #[arg(long, global = true, env = ENV_SQLITE_PATH)]
    pub sqlite_path: Option<String>,

    /// PostgreSQL connection URL (when using postgres backend)
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,
}

/// Parse database backend from CLI/env string
fn parse_database_backend(s: &str) -> Result<Backend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        _ => Err(format!(
            "Invalid database backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Print the SQL generated for a resource and query string
    Explain {
        /// Configured resource name
        resource: String,
        /// Query string, e.g. "fields=id,title&status=draft"
        #[arg(default_value = "")]
        query: String,
        /// Single-record query for this id
        #[arg(long)]
        id: Option<i64>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub database_backend: Option<Backend>,
    pub sqlite_path: Option<String>,
    pub postgres_url: Option<String>,
}

impl From<Cli> for (CliConfig, Option<Commands>) {
    fn from(cli: Cli) -> Self {
        let config = CliConfig {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            database_backend: cli.database_backend,
            sqlite_path: cli.sqlite_path,
            postgres_url: cli.postgres_url,
        };
        (config, cli.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into()
}
