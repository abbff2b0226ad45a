use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::media::LocalMediaStore;
use account_service::outbound::repositories::PostgresUserRepository;
use auth::Authenticator;
use auth::TokenService;
use sqlx::postgres::PgPoolOptions;
use tower_http::services::ServeDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_expiration_minutes = config.jwt.access_expiration_minutes,
        refresh_expiration_days = config.jwt.refresh_expiration_days,
        media_directory = %config.media.directory.display(),
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let tokens = TokenService::new(
        config.jwt.access_secret.as_bytes(),
        config.jwt.refresh_secret.as_bytes(),
    )
    .with_access_lifetime(config.jwt.access_lifetime()?)
    .with_refresh_lifetime(config.jwt.refresh_lifetime()?);

    let authenticator = Arc::new(Authenticator::new(tokens));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let media_store = Arc::new(LocalMediaStore::new(
        &config.media.directory,
        &config.media.public_base_url,
    ));

    let account_service = Arc::new(AccountService::new(
        user_repository,
        media_store,
        authenticator,
    ));

    let http_application = create_router(account_service, config.cookies.clone())
        .nest_service("/media", ServeDir::new(&config.media.directory));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}
