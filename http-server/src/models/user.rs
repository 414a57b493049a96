use ledger::types::{Amount, User, UserId};
use serde::Serialize;

/// User as returned by the API, with the derived total balance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub total_balance: Amount,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            total_balance: user.total_balance(),
            user,
        }
    }
}

/// Identity attached to a request by the auth extractor
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: String,
}
