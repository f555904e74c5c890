use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the motorpool binary.
#[derive(Debug, Parser)]
#[command(name = "motorpool", version, about = "Motorpool vehicle records service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MOTORPOOL_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ServeOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API and the request-log consumer.
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
}

/// Flags that win over every file and prefixed-environment source.
///
/// Each flag also reads the flat environment variable used by existing deployments.
#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Listener host.
    #[arg(long = "host", env = "APP_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Listener port.
    #[arg(long = "port", env = "APP_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Seconds in-flight requests get to finish once shutdown starts.
    #[arg(
        long = "shutdown-grace-seconds",
        env = "SHUTDOWN_GRACE_SECONDS",
        value_name = "SECONDS"
    )]
    pub shutdown_grace_seconds: Option<u64>,

    /// Base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", env = "LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        env = "LOG_JSON",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Full database URL; takes precedence over the individual Postgres parts.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    #[arg(long = "postgres-host", env = "POSTGRES_HOST", value_name = "HOST")]
    pub postgres_host: Option<String>,

    #[arg(long = "postgres-port", env = "POSTGRES_PORT", value_name = "PORT")]
    pub postgres_port: Option<u16>,

    #[arg(long = "postgres-user", env = "POSTGRES_USER", value_name = "USER")]
    pub postgres_user: Option<String>,

    #[arg(
        long = "postgres-password",
        env = "POSTGRES_PASSWORD",
        value_name = "PASSWORD",
        hide_env_values = true
    )]
    pub postgres_password: Option<String>,

    #[arg(long = "postgres-db", env = "POSTGRES_DB", value_name = "NAME")]
    pub postgres_db: Option<String>,

    /// Database pool size.
    #[arg(
        long = "database-max-connections",
        env = "DATABASE_MAX_CONNECTIONS",
        value_name = "COUNT"
    )]
    pub database_max_connections: Option<u32>,

    /// Cache backend (redis|memory).
    #[arg(long = "cache-backend", env = "CACHE_BACKEND", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Lifetime of cached vehicle entries.
    #[arg(long = "cache-ttl-seconds", env = "CACHE_TTL_SECONDS", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    #[arg(long = "redis-addr", env = "REDIS_ADDR", value_name = "HOST:PORT")]
    pub redis_addr: Option<String>,

    #[arg(
        long = "redis-password",
        env = "REDIS_PASSWORD",
        value_name = "PASSWORD",
        hide_env_values = true
    )]
    pub redis_password: Option<String>,

    #[arg(long = "redis-db", env = "REDIS_DB", value_name = "INDEX")]
    pub redis_db: Option<u32>,

    /// Queue backend (kafka|memory).
    #[arg(long = "queue-backend", env = "QUEUE_BACKEND", value_name = "BACKEND")]
    pub queue_backend: Option<String>,

    #[arg(long = "kafka-brokers", env = "KAFKA_BROKERS", value_name = "LIST")]
    pub kafka_brokers: Option<String>,

    #[arg(long = "kafka-topic", env = "KAFKA_TOPIC", value_name = "TOPIC")]
    pub kafka_topic: Option<String>,

    #[arg(long = "kafka-group-id", env = "KAFKA_GROUP_ID", value_name = "GROUP")]
    pub kafka_group_id: Option<String>,

    #[arg(long = "mongo-uri", env = "MONGO_URI", value_name = "URI")]
    pub mongo_uri: Option<String>,

    #[arg(long = "mongo-db", env = "MONGO_DB", value_name = "NAME")]
    pub mongo_db: Option<String>,

    #[arg(long = "mongo-collection", env = "MONGO_COLLECTION", value_name = "NAME")]
    pub mongo_collection: Option<String>,

    #[arg(
        long = "jwt-secret",
        env = "JWT_SECRET",
        value_name = "SECRET",
        hide_env_values = true
    )]
    pub jwt_secret: Option<String>,

    #[arg(
        long = "api-key",
        env = "API_KEY",
        value_name = "KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,
}
