use axum::{Json, extract::State};
use ledger::types::{Amount, ChestGame, ChestOutcome, Difficulty};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::ApiResult,
    middleware::{ApiJson, AuthUser},
    models::UserResponse,
};

// Roulette spin response
#[derive(Serialize)]
pub struct SpinResponse {
    pub won: bool,
    pub message: String,
    pub user: UserResponse,
}

// Chest game start request
#[derive(Deserialize)]
pub struct StartChestRequest {
    pub stake: Amount,
    pub difficulty: Difficulty,
}

// Chest open response
#[derive(Serialize)]
pub struct OpenChestResponse {
    pub outcome: ChestOutcome,
    pub message: String,
    pub game: ChestGame,
}

// Chest cash-out response
#[derive(Serialize)]
pub struct CashoutResponse {
    pub message: String,
    pub game: ChestGame,
    pub user: UserResponse,
}

// Bonus roulette: a win moves the whole locked bonus into the wallet
pub async fn spin(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<SpinResponse>> {
    let result = {
        let mut rng = state.rng();
        state.ledger().spin_roulette(auth.user_id, &mut *rng)?
    };

    let message = if result.won {
        tracing::info!(user_id = auth.user_id, amount = result.unlocked, "bonus unlocked");
        format!("Congratulations! {} bonus unlocked.", result.unlocked)
    } else {
        tracing::debug!(user_id = auth.user_id, "roulette lost");
        "Lost! Try again later.".to_string()
    };

    Ok(Json(SpinResponse {
        won: result.won,
        message,
        user: result.user.into(),
    }))
}

pub async fn start_chest(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    ApiJson(payload): ApiJson<StartChestRequest>,
) -> ApiResult<Json<ChestGame>> {
    let (game, _) = state
        .ledger()
        .start_chest_game(auth.user_id, payload.stake, payload.difficulty)?;
    tracing::info!(
        user_id = auth.user_id,
        game_id = game.id,
        stake = game.stake,
        difficulty = ?game.difficulty,
        "chest game started"
    );
    Ok(Json(game))
}

// The caller's game in progress, or null
pub async fn active_chest(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Json<Option<ChestGame>> {
    Json(state.ledger().active_chest_game(auth.user_id).cloned())
}

pub async fn open_chest(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<OpenChestResponse>> {
    let (outcome, game) = {
        let mut rng = state.rng();
        state.ledger().open_chest(auth.user_id, &mut *rng)?
    };

    let message = match outcome {
        ChestOutcome::Gain => format!("Gain! Multiplier is now x{}", game.current_multiplier),
        ChestOutcome::Loss => format!(
            "Careful! Multiplier dropped to x{}",
            game.current_multiplier
        ),
        ChestOutcome::Trap => format!("Trap! Your stake of {} is lost.", game.stake),
    };
    tracing::info!(
        user_id = auth.user_id,
        game_id = game.id,
        ?outcome,
        multiplier = %game.current_multiplier,
        "chest opened"
    );

    Ok(Json(OpenChestResponse {
        outcome,
        message,
        game,
    }))
}

pub async fn cashout_chest(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<CashoutResponse>> {
    let (game, user) = state.ledger().cash_out_chest_game(auth.user_id)?;
    tracing::info!(
        user_id = auth.user_id,
        game_id = game.id,
        amount = game.secured_gains,
        multiplier = %game.current_multiplier,
        "chest game cashed out"
    );

    Ok(Json(CashoutResponse {
        message: format!(
            "Cashed out {} at x{}",
            game.secured_gains, game.current_multiplier
        ),
        game,
        user: user.into(),
    }))
}
