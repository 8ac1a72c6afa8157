use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::inbox::{Delivery, Inbox, ParticipantConfig};
use super::worker::{discard, spawn_consumer, ReactionSlot};
use crate::message::Message;
use crate::room::{BroadcastSummary, Room, RoomId, WeakRoom};
use crate::shared::{lock, write, ChatError};

/// A chat identity with its own inbox and consumption task.
///
/// `Participant` is a cheap handle; clones refer to the same participant.
/// A participant belongs to at most one room at a time. Once it has left a
/// room its consumption loop is gone and it cannot join again.
#[derive(Clone)]
pub struct Participant {
    inner: Arc<ParticipantInner>,
}

struct ParticipantInner {
    id: Uuid,
    name: String,
    inbox: Inbox,
    reaction: ReactionSlot,
    /// Non-owning link to the current room, updated under the room's membership lock
    room: Mutex<Option<WeakRoom>>,
    cancel: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
    /// Serializes join and leave for this participant
    transition: tokio::sync::Mutex<()>,
}

impl Drop for ParticipantInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Participant {
    /// Creates a detached participant with a reaction that discards everything.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the consumption loop
    /// is spawned immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ParticipantConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: ParticipantConfig) -> Self {
        let name = name.into();
        let (inbox, mailbox) = Inbox::channel(config.delivery);
        let reaction: ReactionSlot = Arc::new(RwLock::new(discard()));
        let cancel = CancellationToken::new();

        // The inbox buffers anything sent before the task is first polled
        let consumer = spawn_consumer(name.clone(), mailbox, reaction.clone(), cancel.clone());

        debug!(participant = %name, delivery = ?config.delivery, "Participant created");

        Self {
            inner: Arc::new(ParticipantInner {
                id: Uuid::new_v4(),
                name,
                inbox,
                reaction,
                room: Mutex::new(None),
                cancel,
                consumer: Mutex::new(Some(consumer)),
                transition: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The room this participant is attached to, if it still exists
    pub fn current_room(&self) -> Option<Room> {
        lock(&self.inner.room).as_ref().and_then(WeakRoom::upgrade)
    }

    /// Whether the consumption loop has been terminated by leaving a room
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Replaces the reaction run for every message dequeued from now on.
    /// A message already being handled finishes with the previous reaction.
    pub fn set_reaction<F>(&self, reaction: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        *write(&self.inner.reaction) = Arc::new(reaction);
    }

    /// Joins `room`, leaving any other room first.
    ///
    /// Every member of `room`, the joiner included, receives an entry
    /// announcement. Joining the room the participant is already in does nothing.
    #[instrument(skip(self, room), fields(participant = %self.inner.name, room = %room.name()))]
    pub async fn join(&self, room: &Room) -> Result<(), ChatError> {
        let _transition = self.inner.transition.lock().await;

        if self.is_closed() {
            return Err(ChatError::ParticipantClosed {
                participant: self.inner.name.clone(),
            });
        }

        let previous = self.current_room();
        if previous.as_ref().is_some_and(|current| current.id() == room.id()) {
            debug!("Already a member, join ignored");
            return Ok(());
        }

        // A refused attach changes nothing, so the previous room is kept
        room.attach(self)?;
        info!(room_id = %room.id(), "Joined room");

        if let Some(previous) = previous {
            info!(previous_room = %previous.name(), "Left previous room");
            if previous.detach(self) {
                previous.announce_left(&self.inner.name).await;
            }
        }

        room.announce_entered(&self.inner.name).await;
        Ok(())
    }

    /// Leaves `room` and terminates the consumption loop.
    ///
    /// When this returns the reaction is not running and never runs again,
    /// even for messages that were already queued. Leaving a room the
    /// participant is not a member of does nothing.
    #[instrument(skip(self, room), fields(participant = %self.inner.name, room = %room.name()))]
    pub async fn leave(&self, room: &Room) {
        let _transition = self.inner.transition.lock().await;

        if !room.detach(self) {
            debug!("Not a member, leave ignored");
            return;
        }

        self.terminate().await;
        info!(room_id = %room.id(), "Left room");

        room.announce_left(&self.inner.name).await;
    }

    /// Broadcasts `text` to every member of the current room, this participant included
    #[instrument(skip(self, text), fields(participant = %self.inner.name))]
    pub async fn send(&self, text: &str) -> Result<BroadcastSummary, ChatError> {
        let room = self.current_room().ok_or_else(|| ChatError::NotInRoom {
            participant: self.inner.name.clone(),
        })?;

        Ok(room.broadcast(&self.inner.name, text).await)
    }

    async fn terminate(&self) {
        self.inner.cancel.cancel();

        let consumer = lock(&self.inner.consumer).take();
        if let Some(handle) = consumer {
            if let Err(e) = handle.await {
                warn!(
                    participant = %self.inner.name,
                    error = %e,
                    "Consumption loop ended abnormally"
                );
            }
        }
    }

    pub(crate) fn is_attached_to(&self, room: RoomId) -> bool {
        lock(&self.inner.room)
            .as_ref()
            .is_some_and(|current| current.id() == room)
    }

    /// Must be called while holding the room's membership lock
    pub(crate) fn attach_to(&self, room: WeakRoom) {
        *lock(&self.inner.room) = Some(room);
    }

    /// Clears the room link if it still points at `room`.
    /// Must be called while holding that room's membership lock.
    pub(crate) fn detach_from(&self, room: RoomId) {
        let mut current = lock(&self.inner.room);
        if current.as_ref().is_some_and(|r| r.id() == room) {
            *current = None;
        }
    }

    pub(crate) async fn deliver(&self, message: Message, wait_limit: Option<Duration>) -> Delivery {
        self.inner.inbox.deliver(message, wait_limit).await
    }

    pub(crate) async fn mark_flush(
        &self,
        wait_limit: Option<Duration>,
    ) -> Option<oneshot::Receiver<()>> {
        self.inner.inbox.mark_flush(wait_limit).await
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
