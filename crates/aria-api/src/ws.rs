// WebSocket chat route: `/ws/{user_id}`.
//
// Handshake, message loop and close-code semantics are ported from
// `websocket.py`'s `websocket_endpoint`/`_handle_user_message`: require a
// token, authenticate, verify it matches the path user id, accept, send
// `connected`, replay the login queue, then loop on inbound frames.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use aria_core::llm::{LlmCallConfig, LlmMessage, LlmMessageRole, LlmStreamEvent};
use aria_storage::CreateMessage;
use aria_worker::StreamMessage;

use crate::AppState;

const POLICY_VIOLATION: u16 = 1008;

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
    session_id: Option<String>,
}

pub async fn chat_ws_handler(
    Path(user_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, user_id, query))
}

async fn close_with_policy_violation(mut socket: WebSocket, reason: &str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: POLICY_VIOLATION,
            reason: reason.to_string().into(),
        })))
        .await;
}

async fn handle_connection(mut socket: WebSocket, state: AppState, user_id: String, query: WsQuery) {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        close_with_policy_violation(socket, "token required").await;
        return;
    };

    let authed_user_id = match state.authenticator.authenticate(&token).await {
        Some(id) => id,
        None => {
            close_with_policy_violation(socket, "invalid token").await;
            return;
        }
    };

    if authed_user_id != user_id {
        warn!(url_user_id = %user_id, token_user_id = %authed_user_id, "ws user_id mismatch");
        close_with_policy_violation(socket, "user_id mismatch").await;
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamMessage>();
    let session_id = state.hub.connect(&user_id, tx).await;

    let connected = StreamMessage::Connected {
        user_id: user_id.clone(),
        session_id: session_id.to_string(),
    };
    if socket
        .send(Message::Text(serde_json::to_string(&connected).unwrap()))
        .await
        .is_err()
    {
        state.hub.disconnect(&user_id, session_id).await;
        return;
    }

    replay_login_queue(&state, &mut socket, &user_id).await;

    info!(user_id = %user_id, session_id = %query.session_id.unwrap_or_default(), "ws connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(msg) = outbound else { break };
                if socket.send(Message::Text(serde_json::to_string(&msg).unwrap())).await.is_err() {
                    break;
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_inbound_text(&state, &mut socket, &user_id, &text).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(user_id = %user_id, %err, "ws read error");
                        break;
                    }
                }
            }
        }
    }

    let was_last = state.hub.disconnect(&user_id, session_id).await;
    info!(user_id = %user_id, was_last, "ws disconnected");
}

/// Returns false if the connection should be torn down.
async fn handle_inbound_text(state: &AppState, socket: &mut WebSocket, user_id: &str, text: &str) -> bool {
    let data: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return true, // invalid JSON is silently dropped, never a disconnect
    };

    let msg_type = data.get("type").and_then(Value::as_str).unwrap_or("");

    match msg_type {
        "ping" | "heartbeat" => {
            let _ = send(socket, StreamMessage::Pong {}).await;
        }
        "user.message" => {
            if handle_user_message(state, socket, user_id, &data).await.is_err() {
                return false;
            }
        }
        "user.navigate" => {
            let route = data
                .get("payload")
                .and_then(|p| p.get("route"))
                .and_then(Value::as_str)
                .unwrap_or("");
            info!(user_id, route, "user navigated");
        }
        "user.approve" => handle_action_decision(socket, &data, "approved").await,
        "user.reject" => handle_action_decision(socket, &data, "rejected").await,
        "modality.change" => {
            let modality = data
                .get("payload")
                .and_then(|p| p.get("modality"))
                .and_then(Value::as_str)
                .unwrap_or("");
            info!(user_id, modality, "modality changed");
        }
        _ => {}
    }

    true
}

async fn send(socket: &mut WebSocket, msg: StreamMessage) -> Result<(), axum::Error> {
    socket
        .send(Message::Text(serde_json::to_string(&msg).unwrap()))
        .await
}

/// Action-queue approval/rejection: actual execution goes through the
/// OAuth broker, out of scope here. Acknowledges the decision back to the
/// client the way `websocket.py`'s `_handle_action_approval` does.
async fn handle_action_decision(socket: &mut WebSocket, data: &Value, status: &str) {
    let Some(action_id) = data
        .get("payload")
        .and_then(|p| p.get("action_id"))
        .and_then(Value::as_str)
    else {
        return;
    };
    let _ = send(
        socket,
        StreamMessage::ActionCompleted {
            action_id: action_id.to_string(),
            status: status.to_string(),
        },
    )
    .await;
}

async fn replay_login_queue(state: &AppState, socket: &mut WebSocket, user_id: &str) {
    let rows = match state.db.drain_login_queue(user_id).await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(user_id, %err, "failed to drain login queue");
            return;
        }
    };

    for row in rows {
        let _ = send(
            socket,
            StreamMessage::Message {
                message: row.message,
                rich_content: None,
                ui_commands: None,
                suggestions: None,
                conversation_id: String::new(),
            },
        )
        .await;
    }
}

async fn handle_user_message(
    state: &AppState,
    socket: &mut WebSocket,
    user_id: &str,
    data: &Value,
) -> Result<(), ()> {
    let payload = data.get("payload").cloned().unwrap_or(Value::Null);
    let message_text = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if message_text.is_empty() {
        return Ok(());
    }

    let conversation_id = resolve_conversation_id(state, user_id, payload.get("conversation_id")).await;

    let _ = send(socket, StreamMessage::Thinking {}).await;

    if let Err(err) = state
        .db
        .append_message(CreateMessage {
            conversation_id,
            role: "user".to_string(),
            content: message_text.clone(),
        })
        .await
    {
        warn!(user_id, %err, "failed to persist user message");
    }

    let context = build_context(state, conversation_id).await;

    let stream = match state
        .gateway
        .stream(user_id, context, LlmCallConfig::new(state.chat_model))
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            let _ = send(
                socket,
                StreamMessage::StreamError {
                    error: chat_failure_message(&err),
                    conversation_id: conversation_id.to_string(),
                    recoverable: true,
                },
            )
            .await;
            return Ok(());
        }
    };

    let mut full_text = String::new();
    let mut stream = stream;
    while let Some(event) = stream.next().await {
        match event {
            Ok(LlmStreamEvent::TextDelta(delta)) => {
                full_text.push_str(&delta);
                let _ = send(
                    socket,
                    StreamMessage::Token {
                        content: delta,
                        conversation_id: conversation_id.to_string(),
                    },
                )
                .await;
            }
            Ok(LlmStreamEvent::ThinkingDelta(_)) | Ok(LlmStreamEvent::ToolCalls(_)) => {}
            Ok(LlmStreamEvent::Done(_)) => {
                let _ = send(
                    socket,
                    StreamMessage::StreamComplete {
                        conversation_id: conversation_id.to_string(),
                    },
                )
                .await;
            }
            Ok(LlmStreamEvent::Error(message)) => {
                let _ = send(
                    socket,
                    StreamMessage::StreamError {
                        error: message,
                        conversation_id: conversation_id.to_string(),
                        recoverable: true,
                    },
                )
                .await;
                return Ok(());
            }
            Err(err) => {
                let _ = send(
                    socket,
                    StreamMessage::StreamError {
                        error: chat_failure_message(&err),
                        conversation_id: conversation_id.to_string(),
                        recoverable: true,
                    },
                )
                .await;
                return Ok(());
            }
        }
    }

    if !full_text.is_empty() {
        if let Err(err) = state
            .db
            .append_message(CreateMessage {
                conversation_id,
                role: "assistant".to_string(),
                content: full_text,
            })
            .await
        {
            warn!(user_id, %err, "failed to persist assistant message");
        }
    }

    Ok(())
}

/// Budget exhaustion gets a polite limit message, not a raw error
/// (`spec.md` §9's user-visible failure behavior).
fn chat_failure_message(err: &aria_core::error::AriaError) -> String {
    if matches!(err, aria_core::error::AriaError::BudgetExceeded(_)) {
        "You've reached today's usage limit. Please try again tomorrow.".to_string()
    } else {
        "I encountered an issue generating my response. Let me try again.".to_string()
    }
}

async fn resolve_conversation_id(state: &AppState, user_id: &str, requested: Option<&Value>) -> uuid::Uuid {
    if let Some(id) = requested.and_then(Value::as_str).and_then(|s| s.parse().ok()) {
        return id;
    }

    match state.db.most_recent_conversation(user_id).await {
        Ok(Some(conv)) => conv.id,
        _ => match state.db.create_conversation(user_id).await {
            Ok(conv) => conv.id,
            Err(err) => {
                warn!(user_id, %err, "failed to create fallback conversation");
                uuid::Uuid::now_v7()
            }
        },
    }
}

async fn build_context(state: &AppState, conversation_id: uuid::Uuid) -> Vec<LlmMessage> {
    match state.db.recent_messages(conversation_id, 20).await {
        Ok(rows) => rows
            .into_iter()
            .map(|row| {
                let role = match row.role.as_str() {
                    "assistant" => LlmMessageRole::Assistant,
                    "system" => LlmMessageRole::System,
                    _ => LlmMessageRole::User,
                };
                LlmMessage::text(role, row.content)
            })
            .collect(),
        Err(err) => {
            warn!(%err, "failed to load conversation context");
            Vec::new()
        }
    }
}
