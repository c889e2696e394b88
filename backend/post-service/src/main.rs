use actix_web::{web, App, HttpServer};
use post_service::db::{create_pool, run_migrations, PgStore};
use post_service::middleware::SessionCookie;
use post_service::services::SessionIssuer;
use post_service::{handlers, AppServices, Config};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Optional .env for local runs
    let _ = dotenvy::dotenv();

    // Initialize tracing
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let sessions = SessionIssuer::from_config(&config.session).map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize session keys: {e}"),
        )
    })?;
    post_service::security::warm_dummy_hash().map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to prepare password hasher: {e}"),
        )
    })?;

    let cookie = SessionCookie::new(
        config.session.cookie_name.clone(),
        config.session.secure_cookie,
        sessions.ttl().num_seconds(),
    );

    let pool = create_pool(&config.database).await.map_err(|e| {
        tracing::error!("Database connection failed: {}", e);
        io::Error::new(io::ErrorKind::Other, format!("Database error: {e}"))
    })?;
    run_migrations(&pool).await.map_err(|e| {
        tracing::error!("Database migration failed: {}", e);
        io::Error::new(io::ErrorKind::Other, format!("Migration error: {e}"))
    })?;
    tracing::info!("Database ready");

    let store = Arc::new(PgStore::new(pool.clone()));
    let services = AppServices::new(store, sessions, cookie);
    let pool_data = web::Data::new(pool);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Listening on http://{}", bind_address);

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(pool_data.clone())
            .configure(handlers::configure_ops)
            .configure(move |cfg| services.configure(cfg))
    })
    .bind(&bind_address)?
    .run()
    .await
}
