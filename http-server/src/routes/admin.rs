use axum::{
    Json,
    extract::{Path, State},
};
use ledger::{
    Decision,
    types::{Transaction, TransactionId, UserId},
};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiResult,
    middleware::{ApiJson, AuthUser},
    websocket::{NotificationType, send_notification_to_user},
};

// Approve/reject request; the body is optional
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub admin_note: Option<String>,
}

// Pending deposits and withdrawals across all users (admin only)
pub async fn pending_transactions(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(state.ledger().pending_transactions(auth.user_id)?))
}

pub async fn approve_transaction(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(transaction_id): Path<TransactionId>,
    payload: Option<ApiJson<ReviewRequest>>,
) -> ApiResult<Json<Transaction>> {
    let note = payload.and_then(|ApiJson(review)| review.admin_note);
    let decision = state
        .ledger()
        .approve_transaction(auth.user_id, transaction_id, note)?;
    Ok(Json(publish(&state, auth.user_id, decision)))
}

pub async fn reject_transaction(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(transaction_id): Path<TransactionId>,
    payload: Option<ApiJson<ReviewRequest>>,
) -> ApiResult<Json<Transaction>> {
    let note = payload.and_then(|ApiJson(review)| review.admin_note);
    let decision = state
        .ledger()
        .reject_transaction(auth.user_id, transaction_id, note)?;
    Ok(Json(publish(&state, auth.user_id, decision)))
}

// Logs the decision and pushes it to the transaction's owner
fn publish(state: &AppState, admin_id: UserId, decision: Decision) -> Transaction {
    let transaction = decision.transaction;
    tracing::info!(
        admin_id,
        transaction_id = transaction.id,
        user_id = transaction.user_id,
        kind = %transaction.kind,
        status = %transaction.status,
        amount = transaction.amount,
        "transaction reviewed"
    );

    send_notification_to_user(
        &state.notification_manager,
        transaction.user_id,
        NotificationType::TransactionUpdated {
            transaction: transaction.clone(),
            user: decision.owner.map(Into::into),
        },
    );
    transaction
}
