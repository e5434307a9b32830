//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::api::extractors::parse_query_string;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::{AppConfig, DatabaseConfig};
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::DatabaseService;
use crate::data::query::SqlQuery;
use crate::data::resources::ListQueryTranslator;
use crate::data::sql::Backend;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<DatabaseService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Explain {
                resource,
                query,
                id,
            }) => {
                let config = AppConfig::load(&cli_config)?;
                return Self::explain(&config, &resource, &query, id);
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let database = DatabaseService::init(&config.database)
            .await
            .with_context(|| format!("Failed to initialize {} database", config.database.backend))?;
        let database = Arc::new(database);
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            database,
        })
    }

    /// Print the statement a request would run, without connecting
    fn explain(config: &AppConfig, resource: &str, query: &str, id: Option<i64>) -> Result<()> {
        let rendered = explain_query(config, resource, query, id)?;
        println!("{}", rendered.sql);
        println!("{}", serde_json::to_string(&rendered.params)?);
        Ok(())
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        let names: Vec<&str> = app.config.resources.names().collect();
        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            app.config.database.backend,
            &database_label(&app.config.database),
            &names,
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}

/// Render the statement for `resource` and `query` on the configured backend
pub fn explain_query(
    config: &AppConfig,
    resource: &str,
    query: &str,
    id: Option<i64>,
) -> Result<SqlQuery> {
    let resource_config = config.resources.get(resource).with_context(|| {
        format!(
            "Resource not found: {} (configured: {})",
            resource,
            config.resources.names().collect::<Vec<_>>().join(", ")
        )
    })?;
    let params = parse_query_string(query).map_err(|e| anyhow::anyhow!("{}", e.message()))?;

    let translator = ListQueryTranslator::new(&resource_config);
    let builder = match id {
        Some(id) => translator.single_query(id, &params),
        None => translator.list_query(&params),
    };
    Ok(builder.build(config.database.backend.dialect()))
}

/// Database location for display, without PostgreSQL credentials
fn database_label(config: &DatabaseConfig) -> String {
    match (config.backend, &config.postgres) {
        (Backend::Postgres, Some(pg)) => {
            let location = pg.url.rsplit_once('@').map_or(pg.url.as_str(), |(_, host)| host);
            location.to_string()
        }
        _ => config.sqlite.path.clone(),
    }
}
