//! Portfolio API - content backend for a portfolio site and its admin panel

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::{
    auth::{authenticate, require_admin},
    config::{Config, ConfigError},
    db::{Store, StoreError},
    error::AppError,
    state::AppState,
};

/// Request bodies above this size are rejected before buffering.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("failed to seed admin: {0}")]
    Bootstrap(#[from] AppError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Configure CORS from the configured origin list.
pub fn configure_cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);

    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::health_ready))
        .route("/auth/login", post(routes::auth::login))
        .route("/projects", get(routes::projects::list_projects))
        .route("/projects/{id}", get(routes::projects::get_project))
        .route("/techstack", get(routes::techstack::list_tech_stack))
        .route("/techstack/{id}", get(routes::techstack::get_tech))
        .route("/emails", post(routes::emails::submit_email))
        .route("/settings", get(routes::settings::get_settings));

    // Any valid token.
    let session = Router::new()
        .route("/auth/verify", get(routes::auth::verify_token))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Valid token with an admin role. Layers run bottom-up, so authenticate
    // attaches the identity before require_admin reads it.
    let admin = Router::new()
        .route("/auth/admin", post(routes::auth::create_admin))
        .route("/projects", post(routes::projects::create_project))
        .route(
            "/projects/{id}",
            put(routes::projects::update_project).delete(routes::projects::delete_project),
        )
        .route("/techstack", post(routes::techstack::create_tech))
        .route(
            "/techstack/{id}",
            put(routes::techstack::update_tech).delete(routes::techstack::delete_tech),
        )
        .route(
            "/techstack/{id}/toggle-visibility",
            put(routes::techstack::toggle_visibility),
        )
        .route("/emails", get(routes::emails::list_emails))
        .route("/emails/mark-all-read", put(routes::emails::mark_all_read))
        .route(
            "/emails/{id}",
            get(routes::emails::get_email).delete(routes::emails::delete_email),
        )
        .route("/emails/{id}/status", put(routes::emails::update_status))
        .route("/emails/{id}/reply", post(routes::emails::reply_to_email))
        .route("/settings", put(routes::settings::update_settings))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest("/api", public.merge(session).merge(admin))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Opens the configured database, or the in-memory store outside production.
async fn open_store(config: &Config) -> Result<Store, StartupError> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; data is lost on restart.");
        return Ok(Store::in_memory());
    };

    match Store::connect(db_config).await {
        Ok(store) => {
            tracing::info!("Connected to database");
            Ok(store)
        }
        Err(e) if config.is_production() => Err(e.into()),
        Err(e) => {
            tracing::warn!(
                "Failed to connect to database: {}. Continuing with the in-memory store.",
                e
            );
            Ok(Store::in_memory())
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Dropping these stops the background log writers.
    let _log_guards = logging::init(&config);

    let store = open_store(&config).await?;
    let mailer = mail::from_config(config.smtp.as_ref());
    let state = AppState::new(config, store, mailer);

    match &state.config.bootstrap_admin {
        Some(seed) => {
            if services::admins::bootstrap(&state.store, &state.passwords, seed).await? {
                tracing::info!("Seeded super admin from ADMIN_EMAIL");
            }
        }
        None => tracing::info!("ADMIN_EMAIL or admin password not set. Skipping admin bootstrap."),
    }

    let host = state.config.host.clone();
    let port = state.config.port;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|source| StartupError::Bind {
            addr: format!("{host}:{port}"),
            source,
        })?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Starting server on {}", addr);
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}
