use axum::{Json, extract::State};
use ledger::types::LeaderboardEntry;

use crate::{AppState, middleware::AuthUser};

pub async fn get_leaderboard(
    State(state): State<AppState>,
    AuthUser(_auth): AuthUser,
) -> Json<Vec<LeaderboardEntry>> {
    Json(state.ledger().leaderboard())
}
