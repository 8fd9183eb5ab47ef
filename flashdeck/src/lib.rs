//! # flashdeck: flashcards with AI-assisted generation
//!
//! `flashdeck` is a small web service for studying with flashcards. Users sign up and log in
//! through a hosted GoTrue-compatible auth service, create and edit their own cards, and can turn
//! pasted notes into cards with an OpenRouter-compatible chat completion model.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). Cards are stored in
//! PostgreSQL through the owner-scoped [`db::store::FlashcardStore`] trait; an in-memory backend
//! is available for local runs and tests.
//!
//! ### Request Flow
//!
//! Requests under `/api/flashcards` carry a bearer access token. The
//! [`CurrentUser`](auth::CurrentUser) extractor resolves it (locally when a JWT secret is
//! configured, otherwise by asking the auth provider) before the body is parsed or storage is
//! touched. Handlers validate input, call the store with the caller's id, and map every failure
//! to a `{message, details?}` JSON envelope through [`errors::Error`].
//!
//! Generation (`POST /api/flashcards/generate`) sends one chat completion through the resilient
//! [`chat`] client, decodes the returned JSON cards, and saves them one by one. The response is a
//! per-card report, so a run that stops halfway still says which cards exist.
//!
//! ### Core Components
//!
//! - [`api`]: route handlers and request/response models
//! - [`auth`]: bearer extraction, local JWT verification and the auth provider client
//! - [`chat`]: chat completion client with per-attempt timeouts and jittered backoff
//! - [`generation`]: notes-to-cards pipeline shared by the server and [`client`]
//! - [`db`]: repository, store backends and migrations
//! - [`client`]: typed HTTP client for this service with explicit sessions
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use flashdeck::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = flashdeck::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     flashdeck::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod http;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::{AuthProvider, GoTrueAuthProvider},
    chat::ChatCompletionClient,
    config::{CorsOrigin, DatabaseConfig},
    db::store::{FlashcardStore, InMemoryFlashcardStore, PgFlashcardStore},
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{FlashcardId, UserId};

/// Application state shared across all request handlers.
///
/// - `config`: configuration loaded at startup
/// - `flashcards`: owner-scoped card storage
/// - `auth`: hosted auth provider used for sign-up, login and token lookups
/// - `chat`: chat completion client; `None` when no OpenRouter key is configured
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .flashcards(Arc::new(PgFlashcardStore::new(pool)))
///     .auth(Arc::new(GoTrueAuthProvider::new(&config.auth)?))
///     .maybe_chat(chat)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub flashcards: Arc<dyn FlashcardStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub chat: Option<Arc<ChatCompletionClient>>,
}

/// Get the flashdeck database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config
        .cors
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard))
    {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without a trailing slash or path
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `/healthz`
/// - `/auth/signup`, `/auth/login`
/// - `/api/flashcards[/{id}]`, `/api/flashcards/generate`, `/api/smart`
/// - `/api-docs/openapi.json` and the Scalar UI at `/docs`
///
/// CORS and request tracing wrap every route.
///
/// # Errors
///
/// Returns an error if a configured CORS origin is not a valid header value.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let api_routes = Router::new()
        .route(
            "/flashcards",
            get(api::handlers::flashcards::list_flashcards).post(api::handlers::flashcards::create_flashcard),
        )
        .route("/flashcards/generate", post(api::handlers::generation::generate))
        .route(
            "/flashcards/{id}",
            get(api::handlers::flashcards::get_flashcard)
                .patch(api::handlers::flashcards::update_flashcard)
                .delete(api::handlers::flashcards::delete_flashcard),
        )
        .route("/smart", post(api::handlers::smart::smart_completion));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/login", post(api::handlers::auth::login))
        .nest("/api", api_routes)
        .with_state(state)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Connect to PostgreSQL and apply migrations when enabled, or fall back to in-memory storage
async fn setup_storage(config: &Config) -> anyhow::Result<(Arc<dyn FlashcardStore>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Postgres {
            url,
            run_migrations,
            pool,
        } => {
            info!("Using PostgreSQL storage");
            let pg_pool = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(pool.acquire_timeout)
                .connect(url)
                .await?;

            if *run_migrations {
                migrator().run(&pg_pool).await?;
                info!("Database migrations applied");
            }

            Ok((Arc::new(PgFlashcardStore::new(pg_pool.clone())), Some(pg_pool)))
        }
        DatabaseConfig::Memory => {
            warn!("Using in-memory storage: flashcards will be lost on shutdown");
            Ok((Arc::new(InMemoryFlashcardStore::new()), None))
        }
    }
}

/// Build the chat completion client when an OpenRouter key is configured
fn setup_chat_client(config: &Config) -> anyhow::Result<Option<Arc<ChatCompletionClient>>> {
    let Some(api_key) = config.openrouter.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
        warn!("No OpenRouter API key configured; /api/smart and generation are unavailable");
        return Ok(None);
    };

    let settings = &config.openrouter;
    let client = ChatCompletionClient::builder()
        .api_key(api_key)
        .base_url(settings.base_url.as_str())
        .max_retries(settings.max_retries)
        .min_retry_delay(settings.min_retry_delay)
        .timeout(settings.timeout)
        .maybe_site_url(settings.site_url.clone())
        .maybe_app_name(settings.app_name.clone())
        .build()?;

    Ok(Some(Arc::new(client)))
}

/// A configured service: router, state and the resources it owns
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting flashdeck with configuration: {:#?}", config);

        let (flashcards, pool) = setup_storage(&config).await?;
        let auth: Arc<dyn AuthProvider> = Arc::new(GoTrueAuthProvider::new(&config.auth)?);
        let chat = setup_chat_client(&config)?;

        let state = AppState::builder()
            .config(config.clone())
            .flashcards(flashcards)
            .auth(auth)
            .maybe_chat(chat)
            .build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("flashdeck listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
