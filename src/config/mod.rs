//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::{SocketAddr, ToSocketAddrs},
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use deadpool_redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "motorpool";
const ENV_PREFIX: &str = "MOTORPOOL";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POSTGRES_HOST: &str = "localhost";
const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_POSTGRES_USER: &str = "cars";
const DEFAULT_POSTGRES_PASSWORD: &str = "cars";
const DEFAULT_POSTGRES_DB: &str = "cars";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
const DEFAULT_KAFKA_TOPIC: &str = "car-api-logs";
const DEFAULT_KAFKA_GROUP_ID: &str = "request-log-consumer";
const DEFAULT_MEMORY_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_PRODUCER_FLUSH_SECS: u64 = 5;
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_MONGO_DB: &str = "cars_logs";
const DEFAULT_MONGO_COLLECTION: &str = "request_logs";
const DEFAULT_JWT_SECRET: &str = "super-secret-change-me";
const DEFAULT_API_KEY: &str = "my-api-key-12345";
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub queue: QueueSettings,
    pub documents: DocumentSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub shutdown_grace: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub connect: PgConnectOptions,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis: ConnectionInfo,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    Kafka,
    Memory,
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub backend: QueueBackend,
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub memory_capacity: NonZeroUsize,
    pub flush_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub api_key: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_serve_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    queue: RawQueueSettings,
    documents: RawDocumentSettings,
    auth: RawAuthSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        let ServeOverrides {
            host,
            port,
            shutdown_grace_seconds,
            log_level,
            log_json,
            database_url,
            postgres_host,
            postgres_port,
            postgres_user,
            postgres_password,
            postgres_db,
            database_max_connections,
            cache_backend,
            cache_ttl_seconds,
            redis_addr,
            redis_password,
            redis_db,
            queue_backend,
            kafka_brokers,
            kafka_topic,
            kafka_group_id,
            mongo_uri,
            mongo_db,
            mongo_collection,
            jwt_secret,
            api_key,
        } = overrides.clone();

        override_with(&mut self.server.host, host);
        override_with(&mut self.server.port, port);
        override_with(
            &mut self.server.shutdown_grace_seconds,
            shutdown_grace_seconds,
        );
        override_with(&mut self.logging.level, log_level);
        override_with(&mut self.logging.json, log_json);
        override_with(&mut self.database.url, database_url);
        override_with(&mut self.database.host, postgres_host);
        override_with(&mut self.database.port, postgres_port);
        override_with(&mut self.database.user, postgres_user);
        override_with(&mut self.database.password, postgres_password);
        override_with(&mut self.database.name, postgres_db);
        override_with(&mut self.database.max_connections, database_max_connections);
        override_with(&mut self.cache.backend, cache_backend);
        override_with(&mut self.cache.ttl_seconds, cache_ttl_seconds);
        override_with(&mut self.cache.redis_addr, redis_addr);
        override_with(&mut self.cache.redis_password, redis_password);
        override_with(&mut self.cache.redis_db, redis_db);
        override_with(&mut self.queue.backend, queue_backend);
        override_with(&mut self.queue.brokers, kafka_brokers);
        override_with(&mut self.queue.topic, kafka_topic);
        override_with(&mut self.queue.group_id, kafka_group_id);
        override_with(&mut self.documents.uri, mongo_uri);
        override_with(&mut self.documents.database, mongo_db);
        override_with(&mut self.documents.collection, mongo_collection);
        override_with(&mut self.auth.jwt_secret, jwt_secret);
        override_with(&mut self.auth.api_key, api_key);
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            queue,
            documents,
            auth,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            queue: build_queue_settings(queue)?,
            documents: build_document_settings(documents)?,
            auth: build_auth_settings(auth)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = non_blank(server.host).unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = resolve_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let grace_secs = server
        .shutdown_grace_seconds
        .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);
    if grace_secs == 0 {
        return Err(LoadError::invalid(
            "server.shutdown_grace_seconds",
            "must be greater than zero",
        ));
    }

    let timeout_secs = server
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "server.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        shutdown_grace: Duration::from_secs(grace_secs),
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match non_blank(logging.level) {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    // Parts go through typed setters so reserved characters in credentials stay literal.
    let connect = match non_blank(database.url) {
        Some(url) => PgConnectOptions::from_str(&url).map_err(|err| {
            LoadError::invalid("database.url", format!("failed to parse: {err}"))
        })?,
        None => {
            let host = non_blank(database.host).unwrap_or_else(|| DEFAULT_POSTGRES_HOST.into());
            let user = non_blank(database.user).unwrap_or_else(|| DEFAULT_POSTGRES_USER.into());
            let password = database
                .password
                .unwrap_or_else(|| DEFAULT_POSTGRES_PASSWORD.into());
            let name = non_blank(database.name).unwrap_or_else(|| DEFAULT_POSTGRES_DB.into());
            PgConnectOptions::new_without_pgpass()
                .host(&host)
                .port(database.port.unwrap_or(DEFAULT_POSTGRES_PORT))
                .username(&user)
                .password(&password)
                .database(&name)
                .ssl_mode(PgSslMode::Disable)
        }
    };

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        connect,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match non_blank(cache.backend).as_deref() {
        None | Some("redis") => CacheBackend::Redis,
        Some("memory") => CacheBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}`, expected `redis` or `memory`"),
            ));
        }
    };

    let addr = non_blank(cache.redis_addr).unwrap_or_else(|| DEFAULT_REDIS_ADDR.into());
    let redis = ConnectionInfo {
        addr: parse_redis_addr(&addr)?,
        redis: RedisConnectionInfo {
            db: i64::from(cache.redis_db.unwrap_or(0)),
            password: non_blank(cache.redis_password),
            ..Default::default()
        },
    };

    let ttl_secs = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        backend,
        redis,
        ttl: Duration::from_secs(ttl_secs),
    })
}

fn build_queue_settings(queue: RawQueueSettings) -> Result<QueueSettings, LoadError> {
    let backend = match non_blank(queue.backend).as_deref() {
        None | Some("kafka") => QueueBackend::Kafka,
        Some("memory") => QueueBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "queue.backend",
                format!("unknown backend `{other}`, expected `kafka` or `memory`"),
            ));
        }
    };

    let memory_capacity = NonZeroUsize::new(
        queue
            .memory_capacity
            .unwrap_or(DEFAULT_MEMORY_QUEUE_CAPACITY),
    )
    .ok_or_else(|| LoadError::invalid("queue.memory_capacity", "must be greater than zero"))?;

    let flush_secs = queue
        .flush_timeout_seconds
        .unwrap_or(DEFAULT_PRODUCER_FLUSH_SECS);

    Ok(QueueSettings {
        backend,
        brokers: non_blank(queue.brokers).unwrap_or_else(|| DEFAULT_KAFKA_BROKERS.into()),
        topic: non_blank(queue.topic).unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.into()),
        group_id: non_blank(queue.group_id).unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.into()),
        memory_capacity,
        flush_timeout: Duration::from_secs(flush_secs),
    })
}

fn build_document_settings(documents: RawDocumentSettings) -> Result<DocumentSettings, LoadError> {
    Ok(DocumentSettings {
        uri: non_blank(documents.uri).unwrap_or_else(|| DEFAULT_MONGO_URI.into()),
        database: non_blank(documents.database).unwrap_or_else(|| DEFAULT_MONGO_DB.into()),
        collection: non_blank(documents.collection)
            .unwrap_or_else(|| DEFAULT_MONGO_COLLECTION.into()),
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let ttl_secs = auth.token_ttl_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "auth.token_ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(AuthSettings {
        api_key: non_blank(auth.api_key).unwrap_or_else(|| DEFAULT_API_KEY.into()),
        jwt_secret: non_blank(auth.jwt_secret).unwrap_or_else(|| DEFAULT_JWT_SECRET.into()),
        token_ttl: Duration::from_secs(ttl_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    shutdown_grace_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    name: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    ttl_seconds: Option<u64>,
    redis_addr: Option<String>,
    redis_password: Option<String>,
    redis_db: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQueueSettings {
    backend: Option<String>,
    brokers: Option<String>,
    topic: Option<String>,
    group_id: Option<String>,
    memory_capacity: Option<usize>,
    flush_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocumentSettings {
    uri: Option<String>,
    database: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    api_key: Option<String>,
    jwt_secret: Option<String>,
    token_ttl_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Accepts IP literals and host names; names resolve to their first address.
fn resolve_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    (host, port)
        .to_socket_addrs()
        .map_err(|err| format!("cannot resolve `{host}:{port}`: {err}"))?
        .next()
        .ok_or_else(|| format!("`{host}` resolved to no addresses"))
}

/// `host:port`, or a bare host on the default port.
fn parse_redis_addr(addr: &str) -> Result<ConnectionAddr, LoadError> {
    let (host, port) = match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|err| {
                LoadError::invalid("cache.redis_addr", format!("invalid port in `{addr}`: {err}"))
            })?;
            (host, port)
        }
        None => (addr, DEFAULT_REDIS_PORT),
    };
    if host.is_empty() {
        return Err(LoadError::invalid(
            "cache.redis_addr",
            format!("missing host in `{addr}`"),
        ));
    }
    Ok(ConnectionAddr::Tcp(host.to_string(), port))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
