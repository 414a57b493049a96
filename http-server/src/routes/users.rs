use axum::{Json, extract::State, http::StatusCode};
use ledger::types::NewUser;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{ApiJson, AuthUser},
    models::UserResponse,
    routes::MessageResponse,
};

const MIN_PASSWORD_LEN: usize = 6;

// Registration request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Login/registration response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub user: UserResponse,
}

// Registration endpoint
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let email = payload.email.trim();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = state.ledger().create_user(NewUser {
        email: email.to_string(),
        full_name: payload.full_name.filter(|name| !name.trim().is_empty()),
        is_admin: state.config.is_admin_email(email),
        bonus: state.config.signup_bonus,
    })?;
    state
        .storage
        .add_credentials(&user.email, user.id, &payload.password);
    let session_id = state.storage.create_session(user.id);

    tracing::info!(user_id = user.id, is_admin = user.is_admin, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            user: user.into(),
        }),
    ))
}

// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user_id = state
        .storage
        .verify_password(&payload.email, &payload.password)
        .ok_or(ApiError::Unauthorized("Invalid email or password"))?;
    let user = state.ledger().user(user_id)?.clone();
    let session_id = state.storage.create_session(user_id);

    tracing::info!(user_id, "login");
    Ok(Json(SessionResponse {
        session_id,
        user: user.into(),
    }))
}

// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Json<MessageResponse> {
    state.storage.end_session(&auth.session_id);
    tracing::info!(user_id = auth.user_id, "logout");
    Json(MessageResponse::new("Logged out"))
}

// Current user endpoint (protected route)
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.ledger().user(auth.user_id)?.clone();
    Ok(Json(user.into()))
}
