//! # sippool: SIP credential pool gateway
//!
//! `sippool` manages a finite pool of SIP credential records for a VoIP web
//! application. It tracks which SIP account each user holds, atomically assigns
//! a free account to a requesting user, releases it back to the pool on logout
//! or deactivation, and reports pool utilization. The actual SIP signaling,
//! user authentication, and UI all live elsewhere; this service owns exactly
//! one thing - the credential records and their assignment state.
//!
//! ## Overview
//!
//! SIP trunk providers hand out a fixed set of accounts; a softphone embedded
//! in a web app needs exactly one of them per logged-in user. The hard part is
//! the handout: two users logging in at the same instant must never receive the
//! same account, and the pool's availability numbers must never drift from
//! reality. `sippool` solves this with per-row conditional updates in
//! PostgreSQL instead of process-level locks, so correctness holds across any
//! number of service replicas.
//!
//! ### Request Flow
//!
//! The backend calls `POST /api/v1/assignments` when a user needs a line. The
//! assignment service reads the available candidates (lowest id first) and
//! claims one with a compare-and-swap UPDATE; losing a race on a candidate
//! moves to the next, bounded by the configured retry budget. On logout the
//! backend calls `DELETE /api/v1/assignments/{user_id}`, which is idempotent.
//! Administrators provision, correct and retire records through the
//! `/api/v1/sip-configs` CRUD surface, and dashboards read
//! `/api/v1/stats/overview`.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) is a thin axum surface translating HTTP into
//! service calls; every response uses the `{success, data, error, code}`
//! envelope. The **assignment service** ([`assignment`]) owns the retry-on-
//! conflict handout algorithm. The **database layer** ([`db`]) uses the
//! repository pattern; its conditional updates are the only code path that
//! ever mutates assignment state. The **watcher** ([`watcher`]) samples pool
//! utilization in the background and warns before the pool runs dry.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use sippool::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = sippool::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     sippool::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! sippool::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod assignment;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod stats;
pub mod telemetry;
pub mod types;
pub mod watcher;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use crate::assignment::Assigner;
use crate::watcher::PoolWatcher;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ConfigId, UserId};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub assigner: Assigner,
}

/// Get the sippool database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Seed the pool with the SIP accounts listed in the configuration.
///
/// Idempotent on (username, domain): accounts already present are left
/// untouched, so manual corrections made through the admin API survive
/// restarts. Returns the number of newly inserted records.
#[instrument(skip_all)]
pub async fn seed_pool(lines: &[config::ProvisionedLine], db: &PgPool) -> anyhow::Result<u64> {
    if lines.is_empty() {
        return Ok(0);
    }

    // One transaction: either the whole seed list lands or none of it
    let mut tx = db.begin().await?;
    let mut inserted = 0u64;
    for line in lines {
        let result = sqlx::query(
            r#"
            INSERT INTO sip_configs (username, password, domain, server, port, transport)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (username, domain) DO NOTHING
            "#,
        )
        .bind(&line.username)
        .bind(&line.password)
        .bind(&line.domain)
        .bind(&line.server)
        .bind(line.port)
        .bind(line.transport)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;

    if inserted > 0 {
        info!(inserted, "seeded SIP pool from configuration");
    } else {
        debug!("SIP pool already seeded, nothing to insert");
    }
    Ok(inserted)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.cors;

    let mut layer = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(tower_http::cors::Any)
    } else {
        let origins = cors
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new().allow_origin(origins)
    };

    layer = layer.allow_credentials(cors.allow_credentials);
    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the application router with all endpoints and middleware.
///
/// The API surface is nested under `/api/v1`; `/healthz` and the Scalar API
/// docs at `/docs` sit at the root.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Pool handout
        .route("/assignments", post(api::handlers::assignments::assign_next))
        .route(
            "/assignments/{user_id}",
            get(api::handlers::assignments::get_assignment).delete(api::handlers::assignments::release_for_user),
        )
        // Admin provisioning
        .route(
            "/sip-configs",
            get(api::handlers::sip_configs::list_sip_configs).post(api::handlers::sip_configs::create_sip_config),
        )
        .route("/sip-configs/available/next", get(api::handlers::sip_configs::peek_next_available))
        .route(
            "/sip-configs/{id}",
            get(api::handlers::sip_configs::get_sip_config)
                .patch(api::handlers::sip_configs::update_sip_config)
                .delete(api::handlers::sip_configs::delete_sip_config),
        )
        // Directed assignment of individual records
        .route("/sip-configs/{id}/assign", put(api::handlers::sip_configs::assign_sip_config))
        .route("/sip-configs/{id}/release", put(api::handlers::sip_configs::release_sip_config))
        // Utilization
        .route("/stats/overview", get(api::handlers::stats::overview));

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes.with_state(state.clone()))
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()));

    // CORS only matters when browser clients are configured
    if !state.config.cors.allowed_origins.is_empty() {
        router = router.layer(create_cors_layer(&state.config)?);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, seeds the pool, and starts the watcher
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: on the shutdown signal, the watcher is stopped and
///    connections are drained gracefully
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    watcher_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting SIP pool gateway with configuration: {:#?}", config);

        let pool = config.database.pool.pool_options().connect(&config.database.url).await?;
        migrator().run(&pool).await?;
        seed_pool(&config.provision, &pool).await?;

        let shutdown_token = CancellationToken::new();
        let watcher_handle = config
            .watcher
            .enabled
            .then(|| PoolWatcher::new(pool.clone(), config.watcher.clone()).spawn(shutdown_token.clone()));

        let state = AppState {
            db: pool.clone(),
            assigner: Assigner::new(&config.assignment),
            config: config.clone(),
        };
        let router = build_router(state)?;

        Ok(Self {
            router,
            config,
            pool,
            watcher_handle,
            shutdown_token,
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "SIP pool gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Stop the watcher and wait for it to finish
        self.shutdown_token.cancel();
        if let Some(handle) = self.watcher_handle {
            let _ = handle.await;
        }

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
