use axum::{
    Router,
    routing::{any, get, post},
};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use ledger::Ledger;
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod websocket;

use config::Config;
use models::{InMemoryStorage, lock};
use routes::admin::{approve_transaction, pending_transactions, reject_transaction};
use routes::game::{active_chest, cashout_chest, open_chest, spin, start_chest};
use routes::leaderboard::get_leaderboard;
use routes::quests::{complete_quest, list_quests};
use routes::users::{get_profile, login, logout, register};
use routes::wallet::{deposit, history, withdraw};
use websocket::{NotificationManager, create_notification_manager, websocket_handler};

// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    // One lock for the whole ledger serializes every balance mutation
    pub ledger: Arc<Mutex<Ledger>>,
    pub rng: Arc<Mutex<StdRng>>,
    pub storage: InMemoryStorage,
    pub config: Arc<Config>,
    pub notification_manager: NotificationManager,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ledger: Arc::new(Mutex::new(Ledger::new())),
            rng: Arc::new(Mutex::new(rng)),
            storage: InMemoryStorage::new(),
            config: Arc::new(config),
            notification_manager: create_notification_manager(),
        }
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        lock(&self.ledger)
    }

    pub fn rng(&self) -> MutexGuard<'_, StdRng> {
        lock(&self.rng)
    }

    // Calendar day that keys daily quests
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(get_profile))
        .route("/api/quests", get(list_quests))
        .route("/api/quests/{id}/complete", post(complete_quest))
        .route("/api/invest/deposit", post(deposit))
        .route("/api/wallet/withdraw", post(withdraw))
        .route("/api/wallet/history", get(history))
        .route("/api/game/spin", post(spin))
        .route("/api/game/chest/start", post(start_chest))
        .route("/api/game/chest/active", get(active_chest))
        .route("/api/game/chest/open", post(open_chest))
        .route("/api/game/chest/cashout", post(cashout_chest))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/admin/transactions/pending", get(pending_transactions))
        .route(
            "/api/admin/transactions/{id}/approve",
            post(approve_transaction),
        )
        .route(
            "/api/admin/transactions/{id}/reject",
            post(reject_transaction),
        )
        .route("/notifications", any(websocket_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();
    let addr = config.addr();
    tracing::info!(
        admins = config.admin_emails.len(),
        signup_bonus = config.signup_bonus,
        seeded = config.rng_seed.is_some(),
        "starting"
    );

    let state = AppState::new(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// Root endpoint
async fn root() -> &'static str {
    "Investment Platform API - POST /api/register or /api/login for a bearer token, then use /api/quests, /api/wallet, /api/game and /api/leaderboard"
}
