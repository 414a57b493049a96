use axum::{Json, extract::State};
use ledger::types::{Amount, Transaction};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiResult,
    middleware::{ApiJson, AuthUser},
    models::UserResponse,
    routes::MessageResponse,
};

// Deposit request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub amount: Amount,
    pub deposit_address: Option<String>,
}

// Withdrawal request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub amount: Amount,
    pub wallet_address: Option<String>,
}

// Deposit endpoint: recorded as pending until an admin approves it
pub async fn deposit(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    ApiJson(payload): ApiJson<DepositRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let transaction = state.ledger().request_deposit(
        auth.user_id,
        payload.amount,
        payload.deposit_address,
    )?;
    tracing::info!(
        user_id = auth.user_id,
        transaction_id = transaction.id,
        amount = transaction.amount,
        "deposit requested"
    );
    Ok(Json(MessageResponse::new(
        "Deposit submitted for admin approval",
    )))
}

// Withdrawal endpoint: the wallet is debited now, the payout waits for an admin
pub async fn withdraw(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    ApiJson(payload): ApiJson<WithdrawRequest>,
) -> ApiResult<Json<UserResponse>> {
    let (transaction, user) = state.ledger().request_withdrawal(
        auth.user_id,
        payload.amount,
        payload.wallet_address,
    )?;
    tracing::info!(
        user_id = auth.user_id,
        transaction_id = transaction.id,
        amount = transaction.amount,
        "withdrawal requested"
    );
    Ok(Json(user.into()))
}

// Transaction history, newest first
pub async fn history(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Json<Vec<Transaction>> {
    Json(state.ledger().transactions_for(auth.user_id))
}
