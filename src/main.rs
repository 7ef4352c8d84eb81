//! acodeaday - Application Entry Point
//!
//! This is the main entry point for the acodeaday server.

use std::net::SocketAddr;
use std::sync::Arc;

use bollard::Docker;
use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use acodeaday::{
    config::{LogFormat, CONFIG},
    db::{self, repositories::{ProblemRepository, ProgressRepository, SubmissionRepository}},
    grading::{GradingEngine, GradingSettings},
    handlers,
    sandbox::DockerExecutor,
    scheduling::{DailySessionSelector, ReviewService},
    state::AppState,
    store::RedisTokenStore,
    utils::{Clock, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    match CONFIG.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting acodeaday server...");

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    // Initialize Docker client
    tracing::info!("Connecting to Docker...");
    let docker = Docker::connect_with_socket_defaults()?;

    // Verify Docker connection
    let docker_info = docker.version().await?;
    tracing::info!(
        "Connected to Docker version: {}",
        docker_info.version.unwrap_or_default()
    );

    // Wire the core services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let progress = Arc::new(ProgressRepository::new(db_pool.clone()));
    let tokens = Arc::new(RedisTokenStore::new(redis_conn));

    let reviews = Arc::new(ReviewService::new(progress.clone(), tokens.clone(), clock.clone()));
    let grading = Arc::new(GradingEngine::new(
        Arc::new(DockerExecutor::new(docker, CONFIG.sandbox.clone())),
        Arc::new(ProblemRepository::new(db_pool.clone())),
        Arc::new(SubmissionRepository::new(db_pool.clone())),
        tokens,
        reviews.clone(),
        clock.clone(),
        GradingSettings::from_config(&CONFIG),
    ));
    let selector = DailySessionSelector::new(progress);

    // Create application state
    let state = AppState::new(
        Some(db_pool),
        grading,
        reviews,
        selector,
        clock,
    );

    // Build the router
    let app = handlers::app(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
