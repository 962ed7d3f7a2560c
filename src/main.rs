use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use barberbook::config::AppConfig;
use barberbook::db;
use barberbook::handlers;
use barberbook::services::payments::SandboxGateway;
use barberbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(SandboxGateway),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/barbers",
            get(handlers::barbers::list_barbers).post(handlers::barbers::create_profile),
        )
        .route("/api/barbers/profile/me", get(handlers::barbers::my_profile))
        .route(
            "/api/barbers/:id",
            get(handlers::barbers::get_barber).put(handlers::barbers::update_profile),
        )
        .route(
            "/api/barbers/:id/services",
            put(handlers::barbers::update_services),
        )
        .route(
            "/api/appointments",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            put(handlers::appointments::update_status),
        )
        .route(
            "/api/appointments/:id/cancel",
            put(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/payments/create-order",
            post(handlers::payments::create_order),
        )
        .route("/api/payments/verify", post(handlers::payments::verify_payment))
        .route(
            "/api/payments/simulate",
            post(handlers::payments::simulate_payment),
        )
        .route(
            "/api/payments/status/:appointment_id",
            get(handlers::payments::payment_status),
        )
        .route("/api/reviews", post(handlers::reviews::create_review))
        .route(
            "/api/reviews/:id",
            put(handlers::reviews::update_review).delete(handlers::reviews::delete_review),
        )
        .route(
            "/api/reviews/barber/:barber_id",
            get(handlers::reviews::barber_reviews),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
