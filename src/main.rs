use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use http::{Method, header};
use std::net::SocketAddr;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod mailer;
mod state;

mod models {
    pub mod pending;
    pub mod session;
    pub mod student;
}

mod repositories {
    pub mod pending;
    pub mod student;
}

mod services {
    pub mod auth;
    pub mod registration;
}

mod handlers {
    pub mod auth;
    pub mod dashboard;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod forms;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route(
            "/verify_email",
            get(handlers::auth::verify_email_link).post(handlers::auth::verify_email_form),
        )
        .route("/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_session,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors);

    let cleanup_state = state.clone();
    let cleanup_interval = Duration::from_secs(config.cleanup_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(cleanup_interval).await;
            tracing::info!("🧹 Running scheduled cleanup of expired pending users...");
            match services::registration::cleanup_expired(&cleanup_state).await {
                Ok(deleted) => {
                    tracing::info!("✅ Cleanup removed {} expired pending users", deleted);
                }
                Err(e) => {
                    tracing::error!("❌ Cleanup job failed: {}", e);
                }
            }
        }
    });

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ Background cleanup job started");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
