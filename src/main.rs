use anyhow::Context;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod config;
mod db;
mod middleware;
mod scheduling;
mod utils;

use crate::api::auth::AuthDoc;
use crate::config::Config;
use crate::db::queries::attendance::AttendanceDoc;
use crate::db::queries::availability::AvailabilityDoc;
use crate::db::queries::chat::ChatDoc;
use crate::db::queries::notification::NotificationDoc;
use crate::db::queries::project::ProjectDoc;
use crate::db::queries::report::ReportDoc;
use crate::db::queries::task::TaskDoc;
use crate::db::queries::user::UserDoc;
use crate::middleware::auth::{access_middleware, create_access_cache, jwt_middleware};
use crate::utils::registry::ConnectionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();
    let config = Config::get();

    std::fs::create_dir_all(&config.log_dir).context("Failed to create logs directory")?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let access_cache = create_access_cache();
    let registry = ConnectionRegistry::new();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .idle_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let merged_doc = AuthDoc::openapi()
        .merge_from(ProjectDoc::openapi())
        .merge_from(TaskDoc::openapi())
        .merge_from(AvailabilityDoc::openapi())
        .merge_from(ReportDoc::openapi())
        .merge_from(NotificationDoc::openapi())
        .merge_from(ChatDoc::openapi())
        .merge_from(AttendanceDoc::openapi())
        .merge_from(UserDoc::openapi());

    // Public routes
    let public_routes = Router::new().merge(api::auth::auth_routes());

    // Private routes
    let private_routes = Router::new()
        .merge(api::project::project_routes())
        .merge(api::task::task_routes())
        .merge(api::availability::availability_routes())
        .merge(api::report::report_routes())
        .merge(api::notification::notification_routes())
        .merge(api::chat::chat_routes())
        .merge(api::attendance::attendance_routes())
        .merge(api::user::user_routes())
        .merge(api::events::event_routes())
        .merge(api::auth::secure_auth_routes())
        .route_layer(from_fn_with_state(pool.clone(), access_middleware))
        .route_layer(from_fn(jwt_middleware));

    let app = Router::new()
        .merge(api::health::health_routes())
        .merge(public_routes)
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(CorsLayer::permissive())
        .layer(Extension(access_cache.clone()))
        .layer(Extension(registry.clone()))
        .with_state(pool.clone());

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    run_server(app, shutdown_tx, pool, config.port).await?;
    println!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: broadcast::Receiver<()>, pool: PgPool) {
    tokio::select! {
        _ = signal::ctrl_c() => println!("Received Ctrl+C, shutting down..."),
        _ = shutdown_rx.recv() => println!("Received shutdown signal."),
    }
    println!("🛠️ Closing database pool...");
    pool.close().await;
    println!("✅ Database pool closed. Server shutting down.");
}

async fn run_server(
    app: Router,
    shutdown_tx: broadcast::Sender<()>,
    pool: PgPool,
    port: u16,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Server running at http://{}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .context("Failed to bind listener")?;

    let shutdown = shutdown_signal(shutdown_tx.subscribe(), pool.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server encountered an error")?;

    Ok(())
}
