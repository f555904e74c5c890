use std::{net::SocketAddr, process, sync::Arc};

use motorpool::{
    application::{
        auth::AuthService,
        error::AppError,
        queue::{LogPublisher, LogSource},
        repos::{RequestLogsRepo, RequestLogsWriteRepo, VehiclesRepo},
        request_logs::{RequestLogConsumer, RequestLogService},
        vehicles::VehicleService,
    },
    cache::{CacheConfig, CacheStore, MemoryStore, RedisStore},
    config::{self, CacheBackend, Command, QueueBackend},
    infra::{
        db::PostgresRepositories,
        documents::MongoRequestLogs,
        error::InfraError,
        http::{self, ApiState, RouterState},
        queue::{KafkaLogProducer, KafkaLogSource, memory_topic},
        telemetry,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();

    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    match cli_args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(settings).await,
        Command::Migrate => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(target = "motorpool::migrate", "migrations applied");
    repositories.close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = init_cache(&settings).await?;
    let (publisher, source) = init_queue(&settings)?;
    let documents = MongoRequestLogs::connect(&settings.documents).await?;

    let vehicles_repo: Arc<dyn VehiclesRepo> = repositories.clone();
    let logs_repo: Arc<dyn RequestLogsRepo> = Arc::new(documents.clone());
    let logs_sink: Arc<dyn RequestLogsWriteRepo> = Arc::new(documents.clone());

    let api_state = ApiState {
        vehicles: Arc::new(VehicleService::new(
            vehicles_repo,
            cache,
            CacheConfig::from(&settings.cache),
        )),
        request_logs: Arc::new(RequestLogService::new(logs_repo)),
        auth: Arc::new(AuthService::from_settings(&settings.auth)),
    };

    let consumer_token = CancellationToken::new();
    let consumer =
        tokio::spawn(RequestLogConsumer::new(source, logs_sink).run(consumer_token.clone()));

    let result = serve_http(
        &settings,
        RouterState {
            api: api_state,
            publisher: publisher.clone(),
        },
    )
    .await;

    consumer_token.cancel();
    match consumer.await {
        Ok(stats) => info!(
            target = "motorpool::shutdown",
            consumed = stats.consumed,
            dropped = stats.dropped,
            failed = stats.failed,
            "request-log consumer joined"
        ),
        Err(err) => warn!(
            target = "motorpool::shutdown",
            error = %err,
            "request-log consumer task failed"
        ),
    }

    if let Err(err) = publisher.close(settings.queue.flush_timeout) {
        warn!(
            target = "motorpool::shutdown",
            error = %err,
            "request-log producer did not flush cleanly"
        );
    }

    repositories.close().await;
    documents.shutdown().await;
    info!(target = "motorpool::shutdown", "shutdown complete");

    result
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = PostgresRepositories::connect(
        settings.database.connect.clone(),
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn init_cache(settings: &config::Settings) -> Result<Arc<dyn CacheStore>, AppError> {
    let store: Arc<dyn CacheStore> = match settings.cache.backend {
        CacheBackend::Redis => {
            Arc::new(RedisStore::connect(settings.cache.redis.clone()).await?)
        }
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
    };
    info!(
        target = "motorpool::cache",
        backend = ?settings.cache.backend,
        ttl_secs = settings.cache.ttl.as_secs(),
        "cache ready"
    );
    Ok(store)
}

fn init_queue(
    settings: &config::Settings,
) -> Result<(Arc<dyn LogPublisher>, Box<dyn LogSource>), AppError> {
    match settings.queue.backend {
        QueueBackend::Kafka => {
            let publisher: Arc<dyn LogPublisher> =
                Arc::new(KafkaLogProducer::new(&settings.queue)?);
            let source: Box<dyn LogSource> =
                Box::new(KafkaLogSource::subscribe(&settings.queue)?);
            Ok((publisher, source))
        }
        QueueBackend::Memory => {
            let (publisher, source) = memory_topic(settings.queue.memory_capacity);
            let publisher: Arc<dyn LogPublisher> = Arc::new(publisher);
            let source: Box<dyn LogSource> = Box::new(source);
            Ok((publisher, source))
        }
    }
}

/// Serve until a shutdown signal, then give in-flight requests the grace
/// period before abandoning them.
async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.server.request_timeout);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "motorpool::http",
        addr = %settings.server.addr,
        "listening"
    );

    let stop = CancellationToken::new();
    let graceful = stop.clone();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { graceful.cancelled().await });
    let mut server = tokio::spawn(async move { server.await });

    let joined = tokio::select! {
        joined = &mut server => joined,
        () = shutdown_signal() => {
            stop.cancel();
            match tokio::time::timeout(settings.server.shutdown_grace, &mut server).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        target = "motorpool::shutdown",
                        grace_secs = settings.server.shutdown_grace.as_secs(),
                        "grace period elapsed; dropping in-flight requests"
                    );
                    server.abort();
                    return Ok(());
                }
            }
        }
    };

    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "motorpool::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "motorpool::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!(target = "motorpool::shutdown", "shutdown signal received");
}
