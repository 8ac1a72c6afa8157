use chrono::Utc;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::registry::Room;
use crate::message::Message;
use crate::participant::inbox::Delivery;
use crate::shared::lock;

/// Per-member outcome counts of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    /// Members present when the broadcast started
    pub recipients: usize,
    /// Messages placed in an inbox
    pub delivered: usize,
    /// Messages refused by a full inbox or timed out waiting for space
    pub dropped: usize,
    /// Members that left before their turn came
    pub skipped: usize,
}

impl Room {
    /// Delivers one message per member, in join order.
    ///
    /// Members that have left since the membership snapshot are skipped. With
    /// blocking inboxes this waits on each full member in turn, so one stuck
    /// reaction delays everyone after it unless a delivery timeout is set.
    #[instrument(skip(self, text), fields(room_id = %self.inner.id))]
    pub(crate) async fn broadcast(&self, from: &str, text: &str) -> BroadcastSummary {
        let _delivery = self.inner.delivery.lock().await;

        let recipients = lock(&self.inner.members).snapshot();
        let sent_at = Utc::now();
        let mut summary = BroadcastSummary {
            recipients: recipients.len(),
            ..Default::default()
        };

        for member in recipients {
            if !member.is_attached_to(self.inner.id) {
                debug!(participant = %member.name(), "Skipping departed member");
                summary.skipped += 1;
                continue;
            }

            let message = Message::new(from, self.inner.id, text, sent_at);
            match member
                .deliver(message, self.inner.config.delivery_timeout)
                .await
            {
                Delivery::Delivered => summary.delivered += 1,
                Delivery::Dropped => {
                    warn!(participant = %member.name(), "Inbox full, message dropped");
                    summary.dropped += 1;
                }
                Delivery::Closed => {
                    debug!(participant = %member.name(), "Inbox closed, member skipped");
                    summary.skipped += 1;
                }
            }
        }

        debug!(
            delivered = summary.delivered,
            dropped = summary.dropped,
            skipped = summary.skipped,
            "Broadcast complete"
        );
        summary
    }

    pub(crate) async fn announce_entered(&self, name: &str) {
        self.announce(&format!("{} has entered the room", name)).await;
    }

    pub(crate) async fn announce_left(&self, name: &str) {
        self.announce(&format!("{} has left the room", name)).await;
    }

    async fn announce(&self, text: &str) {
        if !self.inner.config.announce_membership {
            return;
        }
        self.broadcast(&self.inner.config.system_sender, text).await;
    }

    /// Waits until every message broadcast before this call has been handled
    /// by every member still attached.
    ///
    /// Members that leave while the flush is pending are not waited for. With
    /// a delivery timeout configured, a member that does not catch up in time
    /// is given up on with a warning.
    #[instrument(skip(self), fields(room_id = %self.inner.id, room = %self.inner.name))]
    pub async fn flush(&self) {
        let wait_limit = self.inner.config.delivery_timeout;

        let pending = {
            let _delivery = self.inner.delivery.lock().await;
            let members = lock(&self.inner.members).snapshot();

            let mut pending = Vec::with_capacity(members.len());
            for member in members {
                if !member.is_attached_to(self.inner.id) {
                    continue;
                }
                if let Some(ack) = member.mark_flush(wait_limit).await {
                    pending.push((member.name().to_string(), ack));
                }
            }
            pending
        };

        debug!(members = pending.len(), "Waiting for members to catch up");

        let waits = pending.into_iter().map(|(participant, ack)| async move {
            let acked = match wait_limit {
                Some(limit) => match timeout(limit, ack).await {
                    Ok(acked) => acked.is_ok(),
                    Err(_elapsed) => {
                        warn!(participant = %participant, "Flush timed out for member");
                        return;
                    }
                },
                None => ack.await.is_ok(),
            };

            if !acked {
                debug!(participant = %participant, "Member left before flush completed");
            }
        });

        join_all(waits).await;
    }
}
