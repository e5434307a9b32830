// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "RestQuery";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "restquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".restquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "restquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "RESTQUERY_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "RESTQUERY_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "RESTQUERY_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "RESTQUERY_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5480;

/// Default log filter when neither RESTQUERY_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,restquery=info";

/// API path prefix
pub const API_PREFIX: &str = "/api/v1";

// =============================================================================
// Resources
// =============================================================================

/// Default page size when a request has no `limit`
pub const DEFAULT_MAX_RESULTS: u32 = 20;

// =============================================================================
// Database
// =============================================================================

/// Environment variable for database backend (sqlite, postgres)
pub const ENV_DATABASE_BACKEND: &str = "RESTQUERY_DATABASE_BACKEND";

/// Environment variable for the SQLite database path
pub const ENV_SQLITE_PATH: &str = "RESTQUERY_SQLITE_PATH";

/// Environment variable for the PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "RESTQUERY_POSTGRES_URL";

/// Default SQLite database file, relative to the working directory
pub const SQLITE_DEFAULT_PATH: &str = "restquery.db";

/// SQLite in-memory database path
pub const SQLITE_MEMORY_PATH: &str = ":memory:";

/// SQLite max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Default max connections in pool
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default min connections kept warm
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Default connection acquire timeout
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default max connection lifetime
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Default statement timeout
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout before forcing exit
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
