use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use ledger::types::{Transaction, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::{
    AppState,
    models::{UserResponse, lock},
};

// Notification types that can be sent to users
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum NotificationType {
    #[serde(rename = "transaction_updated")]
    TransactionUpdated {
        transaction: Transaction,
        /// Owner's balances when the decision moved money
        user: Option<UserResponse>,
    },
    #[serde(rename = "connection_established", rename_all = "camelCase")]
    ConnectionEstablished { user_id: UserId, message: String },
}

const CHANNEL_CAPACITY: usize = 100;

// Global notification manager: one channel per user, one receiver per open socket
pub type NotificationManager = Arc<Mutex<HashMap<UserId, broadcast::Sender<NotificationType>>>>;

// Create a new notification manager
pub fn create_notification_manager() -> NotificationManager {
    Arc::new(Mutex::new(HashMap::new()))
}

// Joins the user's channel, creating it for the first connection
pub fn subscribe(
    notification_manager: &NotificationManager,
    user_id: UserId,
) -> broadcast::Receiver<NotificationType> {
    lock(notification_manager)
        .entry(user_id)
        .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
        .subscribe()
}

// Drops the user's channel once no connection is listening on it.
// Call after the connection's receiver has been dropped.
pub fn unsubscribe(notification_manager: &NotificationManager, user_id: UserId) {
    let mut manager = lock(notification_manager);
    if manager
        .get(&user_id)
        .is_some_and(|tx| tx.receiver_count() == 0)
    {
        manager.remove(&user_id);
    }
}

// WebSocket handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket_with_auth(socket, state))
}

// Authentication message structure
#[derive(Debug, Deserialize)]
struct AuthMessage {
    #[serde(rename = "sessionId")]
    session_id: String,
}

fn connection_message(user_id: UserId, message: &str) -> Message {
    let notification = NotificationType::ConnectionEstablished {
        user_id,
        message: message.to_string(),
    };
    Message::Text(
        serde_json::to_string(&notification)
            .unwrap_or_default()
            .into(),
    )
}

// Handle socket with authentication via first message
async fn handle_socket_with_auth(socket: WebSocket, state: AppState) {
    tracing::debug!("WebSocket connection opened, awaiting authentication");

    let (mut sender, mut receiver) = socket.split();

    let user_id = match receiver.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<AuthMessage>(&text) {
            Ok(auth_msg) => match state.storage.get_user_id_by_session(&auth_msg.session_id) {
                Some(user_id) => user_id,
                None => {
                    tracing::warn!("Invalid session ID in WebSocket auth");
                    let _ = sender
                        .send(connection_message(
                            0,
                            "Authentication failed: invalid session ID",
                        ))
                        .await;
                    return;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse WebSocket auth message");
                let _ = sender
                    .send(connection_message(
                        0,
                        "Authentication failed: invalid message format",
                    ))
                    .await;
                return;
            }
        },
        Some(Ok(Message::Close(_))) | None => {
            tracing::debug!("WebSocket connection closed before authentication");
            return;
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "WebSocket error during authentication");
            return;
        }
        _ => {
            tracing::warn!("Unexpected message type during WebSocket authentication");
            return;
        }
    };

    handle_authenticated_socket(sender, receiver, user_id, state).await;
}

async fn handle_authenticated_socket(
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    user_id: UserId,
    state: AppState,
) {
    tracing::info!(user_id, "notifications subscribed");

    let mut rx = subscribe(&state.notification_manager, user_id);

    if sender
        .send(connection_message(
            user_id,
            "Successfully connected to notifications",
        ))
        .await
        .is_err()
    {
        tracing::warn!(user_id, "Failed to send connection message");
    }

    // Client frames carry nothing; only watch for the close
    let mut incoming_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::debug!(user_id, error = %e, "WebSocket receive error");
                    break;
                }
                Ok(_) => {}
            }
        }
    });

    // Forward notifications until the client goes away. `rx` must be
    // dropped before unsubscribing.
    loop {
        let notification = tokio::select! {
            _ = &mut incoming_task => break,
            received = rx.recv() => match received {
                Ok(notification) => notification,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id, skipped, "notification receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        match serde_json::to_string(&notification) {
            Ok(msg_text) => {
                if sender.send(Message::Text(msg_text.into())).await.is_err() {
                    tracing::warn!(user_id, "Failed to send notification");
                    break;
                }
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to serialize notification");
            }
        }
    }

    incoming_task.abort();
    drop(rx);
    unsubscribe(&state.notification_manager, user_id);
    tracing::info!(user_id, "notifications unsubscribed");
}

pub fn send_notification_to_user(
    notification_manager: &NotificationManager,
    user_id: UserId,
    notification: NotificationType,
) {
    let manager = lock(notification_manager);
    if let Some(tx) = manager.get(&user_id) {
        if let Err(e) = tx.send(notification) {
            tracing::warn!(user_id, error = %e, "Failed to send notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_reaches_subscriber_only() {
        let manager = create_notification_manager();
        let mut rx = subscribe(&manager, 1);

        let notification = NotificationType::ConnectionEstablished {
            user_id: 1,
            message: "hello".to_string(),
        };
        send_notification_to_user(&manager, 1, notification.clone());
        send_notification_to_user(&manager, 2, notification);

        match rx.try_recv() {
            Ok(NotificationType::ConnectionEstablished { user_id, message }) => {
                assert_eq!(user_id, 1);
                assert_eq!(message, "hello");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notification_is_tagged() {
        let json = serde_json::to_value(NotificationType::ConnectionEstablished {
            user_id: 5,
            message: "ok".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "connection_established");
        assert_eq!(json["userId"], 5);
    }

    #[test]
    fn test_second_connection_keeps_first_subscribed() {
        let manager = create_notification_manager();
        let first = subscribe(&manager, 1);
        let mut second = subscribe(&manager, 1);
        assert_eq!(lock(&manager).len(), 1);

        // First socket closes; the second must keep receiving
        drop(first);
        unsubscribe(&manager, 1);
        assert!(lock(&manager).contains_key(&1));

        send_notification_to_user(
            &manager,
            1,
            NotificationType::ConnectionEstablished {
                user_id: 1,
                message: "still here".to_string(),
            },
        );
        match second.try_recv() {
            Ok(NotificationType::ConnectionEstablished { message, .. }) => {
                assert_eq!(message, "still here");
            }
            other => panic!("unexpected {other:?}"),
        }

        drop(second);
        unsubscribe(&manager, 1);
        assert!(lock(&manager).is_empty());
    }
}
