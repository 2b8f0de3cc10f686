// Live-stream hub: a process-wide registry mapping user_id to the set of
// open streams, shared mutable state per `spec.md` §5's concurrency model.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An outbound message on the live-stream transport, matching one of
/// `spec.md` §6's outbound shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum StreamMessage {
    #[serde(rename = "connected")]
    Connected { user_id: String, session_id: String },
    #[serde(rename = "aria.thinking")]
    Thinking {},
    #[serde(rename = "aria.token")]
    Token { content: String, conversation_id: String },
    #[serde(rename = "aria.stream_complete")]
    StreamComplete { conversation_id: String },
    #[serde(rename = "aria.stream_error")]
    StreamError {
        error: String,
        conversation_id: String,
        recoverable: bool,
    },
    #[serde(rename = "aria.message")]
    Message {
        message: String,
        rich_content: Option<Value>,
        ui_commands: Option<Value>,
        suggestions: Option<Value>,
        conversation_id: String,
    },
    #[serde(rename = "signal.detected")]
    SignalDetected {
        category: String,
        title: String,
        message: String,
    },
    #[serde(rename = "action.completed")]
    ActionCompleted { action_id: String, status: String },
    #[serde(rename = "pong")]
    Pong {},
}

pub type StreamSender = mpsc::UnboundedSender<StreamMessage>;

/// Registry of open live streams, one entry per connected session. A user
/// may have multiple concurrent streams (multiple tabs/devices).
#[derive(Default)]
pub struct StreamHub {
    streams: RwLock<HashMap<String, Vec<(Uuid, StreamSender)>>>,
}

impl StreamHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a new open stream for `user_id`, returning its session id.
    pub async fn connect(&self, user_id: &str, sender: StreamSender) -> Uuid {
        let session_id = Uuid::now_v7();
        let mut streams = self.streams.write().await;
        streams
            .entry(user_id.to_string())
            .or_default()
            .push((session_id, sender));
        session_id
    }

    /// Unregisters one stream. Returns true if this was the last stream
    /// for the user (they are now considered offline).
    pub async fn disconnect(&self, user_id: &str, session_id: Uuid) -> bool {
        let mut streams = self.streams.write().await;
        let Some(sessions) = streams.get_mut(user_id) else {
            return true;
        };
        sessions.retain(|(id, _)| *id != session_id);
        let now_empty = sessions.is_empty();
        if now_empty {
            streams.remove(user_id);
        }
        now_empty
    }

    pub async fn is_connected(&self, user_id: &str) -> bool {
        let streams = self.streams.read().await;
        streams
            .get(user_id)
            .map(|sessions| !sessions.is_empty())
            .unwrap_or(false)
    }

    /// Broadcasts to every open stream for the user. Silently drops when
    /// none are open -- the caller falls back to an offline delivery path.
    pub async fn send_to_user(&self, user_id: &str, message: StreamMessage) {
        let streams = self.streams.read().await;
        let Some(sessions) = streams.get(user_id) else {
            return;
        };
        for (_, sender) in sessions {
            let _ = sender.send(message.clone());
        }
    }

    /// Typed convenience for `aria.message`, built on `send_to_user`.
    pub async fn send_structured(
        &self,
        user_id: &str,
        message: String,
        rich_content: Option<Value>,
        ui_commands: Option<Value>,
        suggestions: Option<Value>,
        conversation_id: String,
    ) {
        self.send_to_user(
            user_id,
            StreamMessage::Message {
                message,
                rich_content,
                ui_commands,
                suggestions,
                conversation_id,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_then_disconnect_marks_user_offline() {
        let hub = StreamHub::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session_id = hub.connect("user-1", tx).await;
        assert!(hub.is_connected("user-1").await);

        let was_last = hub.disconnect("user-1", session_id).await;
        assert!(was_last);
        assert!(!hub.is_connected("user-1").await);
    }

    #[tokio::test]
    async fn disconnect_only_one_of_several_streams_stays_connected() {
        let hub = StreamHub::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let s1 = hub.connect("user-1", tx1).await;
        let _s2 = hub.connect("user-1", tx2).await;

        let was_last = hub.disconnect("user-1", s1).await;
        assert!(!was_last);
        assert!(hub.is_connected("user-1").await);
    }

    #[tokio::test]
    async fn send_to_disconnected_user_is_a_silent_no_op() {
        let hub = StreamHub::new();
        hub.send_to_user(
            "ghost",
            StreamMessage::Pong {},
        )
        .await;
    }

    #[tokio::test]
    async fn send_reaches_every_open_stream() {
        let hub = StreamHub::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.connect("user-1", tx1).await;
        hub.connect("user-1", tx2).await;

        hub.send_to_user("user-1", StreamMessage::Pong {}).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
