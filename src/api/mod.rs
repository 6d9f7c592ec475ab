//! HTTP/JSON API.
//!
//! ## Endpoints
//!
//! - `GET /health`
//! - `POST /api/signup`
//! - `GET /api/me`
//! - `GET|POST /api/quests`, `DELETE /api/quests/{id}`
//! - `POST /api/complete-quest`
//! - `POST /api/feedback`
//! - `GET /api/leaderboard`
//! - `GET /api/admin/stats`
//!
//! Everything under `/api` except signup needs `Authorization: Bearer <token>`.

mod auth;
mod handlers;
mod types;

pub use auth::{AuthUser, generate_token};
pub use types::{
    AdminStatsResponse, CompleteQuestRequest, CreateQuestRequest, FeedbackRequest,
    HealthResponse, LeaderboardQuery, LeaderboardResponse, MeResponse, QuestsResponse,
    SignupRequest, SignupResponse, StatsQuery,
};

use axum::{
    Router,
    routing::{delete, get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::config::{self, Config, ConfigError};
use crate::xp::Progression;

/// shared server state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub engine: Progression,
    pub offset: FixedOffset,
    pub feedback_xp: i64,
}

impl AppState {
    pub fn new(conn: Connection, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            engine: config.progression()?,
            offset: config.reference_offset()?,
            feedback_xp: config.feedback_xp,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// today in the reference timezone
    pub fn today(&self) -> NaiveDate {
        config::local_day(self.now(), self.offset)
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/signup", post(handlers::signup_handler))
        .route("/me", get(handlers::me_handler))
        .route(
            "/quests",
            get(handlers::list_quests_handler).post(handlers::create_quest_handler),
        )
        .route("/quests/{id}", delete(handlers::delete_quest_handler))
        .route("/complete-quest", post(handlers::complete_quest_handler))
        .route("/feedback", post(handlers::feedback_handler))
        .route("/leaderboard", get(handlers::leaderboard_handler))
        .route("/admin/stats", get(handlers::admin_stats_handler));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .nest("/api", api)
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// bind and serve until ctrl-c
pub async fn run_server(addr: &str, state: AppState) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("hunter-quest listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutting down");
}
