use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::Instrument;
use tracing_subscriber::util::SubscriberInitExt;
use user_accounts_api::{
    AppState,
    config::AppConfig,
    create_router,
    repository::{PostgresUserRepository, RepositoryState},
    telemetry,
};

/// main
///
/// Loads configuration, installs the tracing subscriber, connects to Postgres,
/// applies migrations and serves the router.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Dropping the guards flushes the file sinks, so they live until main returns.
    let (subscriber, _log_guards) = telemetry::subscriber(&config, telemetry::LOG_DIR)
        .expect("FATAL: Failed to open the log files.");
    subscriber.init();

    serve(config).instrument(telemetry::root_span()).await;
}

/// serve
///
/// Startup and the accept loop, inside the root span so every startup record
/// carries the service name.
async fn serve(config: AppConfig) {
    tracing::info!("Application starting in {:?} mode", config.env);
    if config.auth_bypass_enabled() {
        tracing::warn!(
            "x-user-id header authentication is enabled; set APP_ENV=production to disable it"
        );
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let repo = Arc::new(PostgresUserRepository::new(pool)) as RepositoryState;

    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
