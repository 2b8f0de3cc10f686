// Proactive Router: turns an InsightEnvelope into a delivery action.
//
// Category->notification-type mapping ported from `proactive_router.py`'s
// `type_map`; realized here as `aria_contracts::delivery::NotificationType`'s
// `From<InsightCategory>` impl. Dedup window one hour on
// (user_id, category, title), exactly as specified.

use std::sync::Arc;

use aria_contracts::delivery::{DeliveryDecision, NotificationType};
use aria_contracts::insight::{InsightCategory, InsightEnvelope, InsightPriority};
use aria_storage::{CreateBriefingQueueEntry, CreateLoginQueueEntry, CreateNotification, Database};

use crate::ws_hub::{StreamHub, StreamMessage};

pub struct ProactiveRouter {
    db: Database,
    hub: Arc<StreamHub>,
}

impl ProactiveRouter {
    pub fn new(db: Database, hub: Arc<StreamHub>) -> Self {
        Self { db, hub }
    }

    /// Routes one insight. Consults the dedup window first; on a hit,
    /// returns `suppressed_duplicate` without touching any queue.
    pub async fn route(&self, envelope: InsightEnvelope) -> anyhow::Result<DeliveryDecision> {
        let notification_type = NotificationType::from(envelope.category);
        let type_key = notification_type_key(notification_type);

        if self
            .db
            .find_recent_duplicate_notification(&envelope.user_id, type_key, &envelope.title)
            .await?
            .is_some()
        {
            return Ok(DeliveryDecision::duplicate());
        }

        let decision = match envelope.priority {
            InsightPriority::High => self.route_high(&envelope, type_key).await?,
            InsightPriority::Medium => self.route_medium(&envelope, type_key).await?,
            InsightPriority::Low => self.route_low(&envelope).await?,
        };

        Ok(decision)
    }

    async fn route_high(
        &self,
        envelope: &InsightEnvelope,
        type_key: &str,
    ) -> anyhow::Result<DeliveryDecision> {
        if self.hub.is_connected(&envelope.user_id).await {
            self.hub
                .send_structured(
                    &envelope.user_id,
                    envelope.message.clone(),
                    Some(envelope.metadata.clone()),
                    None,
                    None,
                    String::new(),
                )
                .await;
            return Ok(DeliveryDecision {
                live_stream: true,
                ..DeliveryDecision::none()
            });
        }

        self.create_notification(envelope, type_key).await?;
        self.db
            .enqueue_login_message(CreateLoginQueueEntry {
                user_id: envelope.user_id.clone(),
                title: envelope.title.clone(),
                message: envelope.message.clone(),
                category: category_key(envelope.category).to_string(),
                metadata: envelope.metadata.clone(),
            })
            .await?;

        Ok(DeliveryDecision {
            login_queue: true,
            notification: true,
            ..DeliveryDecision::none()
        })
    }

    async fn route_medium(
        &self,
        envelope: &InsightEnvelope,
        type_key: &str,
    ) -> anyhow::Result<DeliveryDecision> {
        self.create_notification(envelope, type_key).await?;

        if self.hub.is_connected(&envelope.user_id).await {
            self.hub
                .send_to_user(
                    &envelope.user_id,
                    StreamMessage::SignalDetected {
                        category: category_key(envelope.category).to_string(),
                        title: envelope.title.clone(),
                        message: envelope.message.clone(),
                    },
                )
                .await;
        }

        Ok(DeliveryDecision {
            notification: true,
            ..DeliveryDecision::none()
        })
    }

    async fn route_low(&self, envelope: &InsightEnvelope) -> anyhow::Result<DeliveryDecision> {
        self.db
            .enqueue_briefing(CreateBriefingQueueEntry {
                user_id: envelope.user_id.clone(),
                title: envelope.title.clone(),
                message: envelope.message.clone(),
                category: category_key(envelope.category).to_string(),
                metadata: envelope.metadata.clone(),
            })
            .await?;

        Ok(DeliveryDecision {
            briefing_queue: true,
            ..DeliveryDecision::none()
        })
    }

    async fn create_notification(
        &self,
        envelope: &InsightEnvelope,
        type_key: &str,
    ) -> anyhow::Result<()> {
        self.db
            .create_notification(CreateNotification {
                user_id: envelope.user_id.clone(),
                notification_type: type_key.to_string(),
                title: envelope.title.clone(),
                message: envelope.message.clone(),
                link: envelope.link.clone(),
                metadata: envelope.metadata.clone(),
            })
            .await?;
        Ok(())
    }
}

/// Each `InsightEnvelope.category` maps deterministically to a
/// notification type key. An unmapped category defaults to a generic
/// "signal detected" type -- in this closed enum every variant is mapped,
/// so the default branch exists only to document the contract.
fn notification_type_key(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::MarketSignal => "SIGNAL_DETECTED",
        NotificationType::WeeklyDigest => "WEEKLY_DIGEST_READY",
        NotificationType::MeetingDebrief => "DEBRIEF_PROMPT",
        NotificationType::OverdueCommitment => "OVERDUE_COMMITMENT",
    }
}

fn category_key(category: InsightCategory) -> &'static str {
    match category {
        InsightCategory::MarketSignal => "market_signal",
        InsightCategory::WeeklyDigest => "weekly_digest",
        InsightCategory::MeetingDebrief => "meeting_debrief",
        InsightCategory::OverdueCommitment => "overdue_commitment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_notification_type_mapping() {
        for category in [
            InsightCategory::MarketSignal,
            InsightCategory::WeeklyDigest,
            InsightCategory::MeetingDebrief,
            InsightCategory::OverdueCommitment,
        ] {
            let mapped = NotificationType::from(category);
            assert!(!notification_type_key(mapped).is_empty());
        }
    }
}
