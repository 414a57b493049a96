pub mod admin;
pub mod game;
pub mod leaderboard;
pub mod quests;
pub mod users;
pub mod wallet;

use serde::Serialize;

// Plain acknowledgement body
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
