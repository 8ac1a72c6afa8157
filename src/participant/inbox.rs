use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::message::Message;

/// What happens when a room delivers into a participant's inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Never blocks the sender. A slow reaction lets the inbox grow without limit.
    #[default]
    Unbounded,
    /// Holds at most `capacity` undelivered messages (a capacity of 0 is treated as 1)
    Bounded { capacity: usize, overflow: Overflow },
}

/// Behaviour of a bounded inbox that is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// The broadcaster waits for space, up to the room's delivery timeout if one is set.
    /// A stuck reaction stalls the sender and every member after this one.
    Block,
    /// The incoming message is dropped for this participant only
    DropNewest,
}

impl DeliveryPolicy {
    /// Bounded inbox that applies backpressure to the sender
    pub fn blocking(capacity: usize) -> Self {
        DeliveryPolicy::Bounded {
            capacity,
            overflow: Overflow::Block,
        }
    }

    /// Bounded inbox that sheds new messages when full
    pub fn dropping(capacity: usize) -> Self {
        DeliveryPolicy::Bounded {
            capacity,
            overflow: Overflow::DropNewest,
        }
    }
}

/// Configuration applied when a participant is created
#[derive(Debug, Clone, Default)]
pub struct ParticipantConfig {
    pub delivery: DeliveryPolicy,
}

impl ParticipantConfig {
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }
}

/// Items travelling through an inbox
pub(crate) enum Envelope {
    Message(Message),
    /// Acknowledged by the consumption loop once everything queued before it was handled
    Flush(oneshot::Sender<()>),
}

/// Outcome of handing one message to one inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    Dropped,
    /// The consumption loop has terminated
    Closed,
}

/// Sending half of a participant's inbox
pub(crate) enum Inbox {
    Unbounded(mpsc::UnboundedSender<Envelope>),
    Bounded {
        tx: mpsc::Sender<Envelope>,
        overflow: Overflow,
    },
}

/// Receiving half, owned by the consumption loop
pub(crate) enum Mailbox {
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
    Bounded(mpsc::Receiver<Envelope>),
}

impl Inbox {
    pub(crate) fn channel(policy: DeliveryPolicy) -> (Inbox, Mailbox) {
        match policy {
            DeliveryPolicy::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Inbox::Unbounded(tx), Mailbox::Unbounded(rx))
            }
            DeliveryPolicy::Bounded { capacity, overflow } => {
                let (tx, rx) = mpsc::channel(capacity.max(1));
                (Inbox::Bounded { tx, overflow }, Mailbox::Bounded(rx))
            }
        }
    }

    /// Hands a message to the inbox according to its overflow policy.
    /// `wait_limit` only applies to blocking inboxes.
    pub(crate) async fn deliver(&self, message: Message, wait_limit: Option<Duration>) -> Delivery {
        let envelope = Envelope::Message(message);

        match self {
            Inbox::Unbounded(tx) => match tx.send(envelope) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
            Inbox::Bounded {
                tx,
                overflow: Overflow::DropNewest,
            } => match tx.try_send(envelope) {
                Ok(()) => Delivery::Delivered,
                Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
                Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
            },
            Inbox::Bounded {
                tx,
                overflow: Overflow::Block,
            } => send_bounded(tx, envelope, wait_limit).await,
        }
    }

    /// Queues a flush marker behind everything already in the inbox.
    ///
    /// Markers wait for space even on dropping inboxes, so a successful return
    /// always yields a receiver that resolves once the loop reaches the marker.
    pub(crate) async fn mark_flush(
        &self,
        wait_limit: Option<Duration>,
    ) -> Option<oneshot::Receiver<()>> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = Envelope::Flush(ack_tx);

        let delivery = match self {
            Inbox::Unbounded(tx) => match tx.send(envelope) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
            Inbox::Bounded { tx, .. } => send_bounded(tx, envelope, wait_limit).await,
        };

        (delivery == Delivery::Delivered).then_some(ack_rx)
    }
}

async fn send_bounded(
    tx: &mpsc::Sender<Envelope>,
    envelope: Envelope,
    wait_limit: Option<Duration>,
) -> Delivery {
    let result = match wait_limit {
        Some(limit) => match timeout(limit, tx.send(envelope)).await {
            Ok(result) => result,
            Err(_elapsed) => return Delivery::Dropped,
        },
        None => tx.send(envelope).await,
    };

    match result {
        Ok(()) => Delivery::Delivered,
        Err(_) => Delivery::Closed,
    }
}

impl Mailbox {
    /// Next envelope, or `None` once every sender is gone. Cancel safe.
    pub(crate) async fn recv(&mut self) -> Option<Envelope> {
        match self {
            Mailbox::Unbounded(rx) => rx.recv().await,
            Mailbox::Bounded(rx) => rx.recv().await,
        }
    }
}
