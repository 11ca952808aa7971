mod cart;
mod config;
mod database;
mod delivery;
mod error;
mod handlers;
mod middleware;
mod models;
mod notifications;
mod order_status;
mod pricing;
mod repository;
mod services;
mod state;
mod storage;
mod utils;
mod validation;
mod wishlist;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use dotenvy::dotenv;

use config::Config;
use database::create_database_pool;
use notifications::{LogEmailSender, LogSmsSender, Notifier};
use state::AppState;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let db = create_database_pool(&config.database_url).await?;

    let (notifier, _worker) = Notifier::spawn(
        Arc::new(LogEmailSender::new(config.email_from.clone())),
        Arc::new(LogSmsSender),
        config.notification_queue_size,
    );

    let state = AppState {
        db,
        config: Arc::new(config),
        notifier,
    };

    services::consultations::spawn_reminder_task(state.clone(), state.config.reminder_interval);

    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = create_router(state);

    log::info!("Tailorline server starting on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))

        // Catalogue
        .route("/api/products", get(handlers::catalog::list_products))
        // Both product routes share the segment name; `get_product` takes a slug or an id.
        .route("/api/products/:product", get(handlers::catalog::get_product))
        .route(
            "/api/products/:product/reviews",
            get(handlers::catalog::list_reviews).post(handlers::catalog::create_review),
        )
        .route("/api/collections", get(handlers::catalog::list_collections))
        .route("/api/collections/:slug", get(handlers::catalog::get_collection))
        .route("/api/fabrics", get(handlers::catalog::list_fabrics))

        // Cart
        .route(
            "/api/cart",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/api/cart/items", post(handlers::cart::add_item))
        .route("/api/cart/items/:id", delete(handlers::cart::remove_item))
        .route("/api/cart/items/:id/quantity", patch(handlers::cart::update_quantity))
        .route("/api/cart/items/:id/service-type", patch(handlers::cart::update_service_type))
        .route("/api/cart/toggle", post(handlers::cart::toggle_cart))

        // Wishlist
        .route(
            "/api/wishlist",
            get(handlers::wishlist::get_wishlist).delete(handlers::wishlist::clear_wishlist),
        )
        .route(
            "/api/wishlist/:product_id",
            get(handlers::wishlist::is_in_wishlist)
                .post(handlers::wishlist::add_item)
                .delete(handlers::wishlist::remove_item),
        )

        // Orders and consultations
        .route(
            "/api/orders",
            get(handlers::orders::list_orders).post(handlers::orders::place_order),
        )
        .route("/api/orders/:id", get(handlers::orders::get_order))
        .route(
            "/api/consultations",
            get(handlers::consultations::list_consultations)
                .post(handlers::consultations::book_consultation),
        )

        // Account
        .route(
            "/api/measurements",
            get(handlers::account::list_measurements).post(handlers::account::create_measurement),
        )
        .route(
            "/api/addresses",
            get(handlers::account::list_addresses).post(handlers::account::create_address),
        )

        // Inquiries
        .route("/api/contact", post(handlers::inquiries::submit_contact))
        .route("/api/newsletter", post(handlers::inquiries::subscribe))

        // Lookups
        .route("/api/pricing/quote", get(handlers::tools::price_quote))
        .route("/api/delivery/estimate", get(handlers::tools::delivery_estimate))
        .route("/api/order-status/:status", get(handlers::tools::order_status))
        .route("/api/service-area/:pincode", get(handlers::tools::service_area))

        // Admin
        .route("/api/admin/orders", get(handlers::admin::list_orders))
        .route("/api/admin/orders/:id/status", post(handlers::admin::update_order_status))
        .route("/api/admin/consultations", get(handlers::admin::list_consultations))
        .route(
            "/api/admin/consultations/:id/status",
            post(handlers::admin::update_consultation_status),
        )
        .route("/api/admin/consultations/reminders", post(handlers::admin::send_reminders))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2MB
        )
        .with_state(state)
}
