use std::sync::{Arc, RwLock};
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::inbox::{Envelope, Mailbox};
use crate::message::Message;
use crate::shared::read;

/// Callback invoked once per delivered message
pub(crate) type Reaction = Arc<dyn Fn(Message) + Send + Sync>;

/// Shared slot holding the current reaction; replaced wholesale, read once per message
pub(crate) type ReactionSlot = Arc<RwLock<Reaction>>;

pub(crate) fn discard() -> Reaction {
    Arc::new(|_message: Message| {})
}

/// Spawns the consumption loop for one participant.
///
/// The loop is the only reader of `mailbox` and the only caller of the
/// reaction, so reactions never run concurrently and see messages in inbox
/// order. Each reaction runs on the blocking pool so a slow one never holds
/// up other participants' loops. Cancellation is checked before every
/// receive and wins over queued messages.
pub(crate) fn spawn_consumer(
    participant: String,
    mailbox: Mailbox,
    reaction: ReactionSlot,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(consume(participant, mailbox, reaction, cancel))
}

async fn consume(
    participant: String,
    mut mailbox: Mailbox,
    reaction: ReactionSlot,
    cancel: CancellationToken,
) {
    info!(participant = %participant, "Consumption loop started");

    loop {
        let envelope = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = mailbox.recv() => envelope,
        };

        match envelope {
            Some(Envelope::Message(message)) => {
                let current = read(&reaction).clone();
                react(&participant, current, message).await;
            }
            Some(Envelope::Flush(ack)) => {
                // The flusher may have given up waiting
                let _ = ack.send(());
            }
            None => break,
        }
    }

    info!(participant = %participant, "Consumption loop stopped");
}

/// Runs one reaction off the runtime threads, containing any panic to this participant
async fn react(participant: &str, reaction: Reaction, message: Message) {
    debug!(
        participant = %participant,
        from = %message.from,
        "Delivering message to reaction"
    );

    let outcome = task::spawn_blocking(move || reaction(message)).await;

    if let Err(e) = outcome {
        if !e.is_panic() {
            error!(participant = %participant, error = %e, "Reaction did not complete");
            return;
        }

        let panic_info = e.into_panic();
        let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        error!(
            participant = %participant,
            panic = %panic_msg,
            "Reaction panicked, message discarded"
        );
    }
}
