use axum::{
    Json,
    extract::{Path, State},
};
use ledger::types::{Quest, QuestId};
use serde::Serialize;

use crate::{AppState, error::ApiResult, middleware::AuthUser, models::UserResponse};

// Quest completion response
#[derive(Serialize)]
pub struct CompleteQuestResponse {
    pub quest: Quest,
    pub user: UserResponse,
}

// Today's quests, generated on the first request of the day
pub async fn list_quests(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<Vec<Quest>>> {
    let today = state.today();
    let quests = state.ledger().daily_quests(auth.user_id, today)?;
    tracing::debug!(user_id = auth.user_id, %today, count = quests.len(), "daily quests");
    Ok(Json(quests))
}

pub async fn complete_quest(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(quest_id): Path<QuestId>,
) -> ApiResult<Json<CompleteQuestResponse>> {
    let (quest, user) = state.ledger().complete_quest(auth.user_id, quest_id)?;
    tracing::info!(
        user_id = auth.user_id,
        quest_id,
        reward = quest.reward_amount,
        "quest completed"
    );
    Ok(Json(CompleteQuestResponse {
        quest,
        user: user.into(),
    }))
}
