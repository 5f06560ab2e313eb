use std::net::SocketAddr;
use std::sync::Arc;

use tabula_api::config::{ImageHostKind, ServerConfig};
use tabula_api::router::build_app_router;
use tabula_api::state::AppState;
use tabula_cloud::{CloudinaryConfig, CloudinaryHost, ImageHost, LocalHost};
use tabula_db::DbPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "tabula_api=debug,tabula_db=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        image_host = ?config.image_host,
        "Configuration loaded",
    );

    let pool = connect_database().await;
    let image_host = build_image_host(&config).await;

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        image_host,
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

/// Connect to `DATABASE_URL`, verify it answers and apply pending migrations.
async fn connect_database() -> DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tabula_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tabula_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tabula_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database ready");
    pool
}

/// Construct the configured image host. Misconfiguration aborts startup.
async fn build_image_host(config: &ServerConfig) -> Arc<dyn ImageHost> {
    match config.image_host {
        ImageHostKind::Local => {
            let host = LocalHost::new(config.media_dir.clone(), config.media_base_url.clone());
            host.ensure_root()
                .await
                .expect("Failed to create the media directory");
            tracing::info!(dir = %config.media_dir.display(), "Storing images on local disk");
            Arc::new(host)
        }
        ImageHostKind::Cloudinary => {
            let cloudinary =
                CloudinaryConfig::from_env().expect("Invalid Cloudinary configuration");
            tracing::info!(cloud_name = %cloudinary.cloud_name, "Storing images on Cloudinary");
            Arc::new(CloudinaryHost::new(cloudinary))
        }
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down");
}
