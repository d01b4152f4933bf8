use axum::{
    routing::{get, post, put},
    Json, Router,
};
use moka::future::Cache;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use gearstore_domain::review::ReviewStatistics;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

use config::Config;
use handlers::{carts, orders, products, reviews};

pub struct AppState {
    pub db: sqlx::PgPool,
    pub jwt_secret: String,
    // Read-side memo: product id -> review statistics, dropped on new review.
    pub stats_cache: Cache<Uuid, ReviewStatistics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database.");
    sqlx::migrate!("./migrations").run(&pool).await?;

    let shared_state = Arc::new(AppState {
        db: pool,
        jwt_secret: config.jwt_secret.clone(),
        stats_cache: Cache::new(10_000),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/readyz", get(health_check))
        .route(
            "/api/cart/client/:client_id",
            get(carts::get_cart_for_client),
        )
        .route("/api/cart", post(carts::add_to_cart))
        .route(
            "/api/cart/:id",
            put(carts::update_cart_line).delete(carts::delete_cart_or_line),
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/orders/:id",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route(
            "/api/reviews/producto/:producto_id",
            get(reviews::list_by_product),
        )
        .route(
            "/api/reviews/producto/:producto_id/estadisticas",
            get(reviews::statistics),
        )
        .route("/api/reviews", post(reviews::create_review))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Gearstore gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gearstore-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
