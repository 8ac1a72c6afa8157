use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, instrument};

use super::{
    config::RoomConfig,
    models::{Members, RoomId},
};
use crate::participant::Participant;
use crate::shared::{lock, ChatError};

/// A named set of participants and the fan-out point for their messages.
///
/// `Room` is a cheap handle; clones refer to the same room. Membership is
/// guarded by a single lock that is never held across an await, and
/// broadcasts are serialized so every member sees the room's messages in
/// the same order.
#[derive(Clone)]
pub struct Room {
    pub(super) inner: Arc<RoomInner>,
}

pub(crate) struct RoomInner {
    pub(super) id: RoomId,
    pub(super) name: String,
    pub(super) config: RoomConfig,
    pub(super) members: Mutex<Members>,
    /// Held for the whole fan-out of one broadcast or flush
    pub(super) delivery: tokio::sync::Mutex<()>,
    pub(super) closed: AtomicBool,
}

/// Non-owning link from a participant back to its room
#[derive(Clone)]
pub(crate) struct WeakRoom {
    id: RoomId,
    inner: Weak<RoomInner>,
}

impl WeakRoom {
    pub(crate) fn id(&self) -> RoomId {
        self.id
    }

    pub(crate) fn upgrade(&self) -> Option<Room> {
        self.inner.upgrade().map(|inner| Room { inner })
    }
}

impl Room {
    /// Creates an empty room with the default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, RoomConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: RoomConfig) -> Self {
        let name = name.into();
        let id = RoomId::new();
        debug!(room_id = %id, room = %name, "Room created");

        Self {
            inner: Arc::new(RoomInner {
                id,
                name,
                config,
                members: Mutex::new(Members::default()),
                delivery: tokio::sync::Mutex::new(()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> RoomId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &RoomConfig {
        &self.inner.config
    }

    /// Member names in join order, as of this call
    pub fn chatters(&self) -> Vec<String> {
        lock(&self.inner.members).names()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.members).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a member with this name is present
    pub fn contains(&self, name: &str) -> bool {
        lock(&self.inner.members).find(name).is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Same as [`Participant::join`]
    pub async fn join(&self, participant: &Participant) -> Result<(), ChatError> {
        participant.join(self).await
    }

    /// Same as [`Participant::leave`]
    pub async fn leave(&self, participant: &Participant) {
        participant.leave(self).await
    }

    /// Flushes pending messages, then makes every member leave.
    ///
    /// The room refuses joins from the moment close starts. Each departure is
    /// announced to the members that remain.
    #[instrument(skip(self), fields(room_id = %self.inner.id, room = %self.inner.name))]
    pub async fn close(&self) {
        {
            let _members = lock(&self.inner.members);
            self.inner.closed.store(true, Ordering::SeqCst);
        }

        self.flush().await;

        let members = lock(&self.inner.members).snapshot();
        info!(members = members.len(), "Closing room");

        for member in members {
            member.leave(self).await;
        }

        info!("Room closed");
    }

    pub(crate) fn downgrade(&self) -> WeakRoom {
        WeakRoom {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn check_joinable_locked(
        &self,
        members: &Members,
        participant: &Participant,
    ) -> Result<(), ChatError> {
        if self.is_closed() {
            return Err(ChatError::RoomClosed { room: self.id() });
        }

        match members.find(participant.name()) {
            Some(existing) if existing.id() != participant.id() => Err(ChatError::NameTaken {
                room: self.id(),
                name: participant.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Appends `participant` to the membership and points it at this room,
    /// both under the membership lock
    pub(crate) fn attach(&self, participant: &Participant) -> Result<(), ChatError> {
        let mut members = lock(&self.inner.members);
        self.check_joinable_locked(&members, participant)?;

        if !members.has_participant(participant) {
            members.add_participant(participant.clone());
        }
        participant.attach_to(self.downgrade());

        debug!(
            room_id = %self.inner.id,
            participant = %participant.name(),
            members = members.len(),
            "Participant attached"
        );
        Ok(())
    }

    /// Removes `participant` and clears its room link, both under the
    /// membership lock. Returns false when it was not a member.
    pub(crate) fn detach(&self, participant: &Participant) -> bool {
        let mut members = lock(&self.inner.members);
        if !members.remove_participant(participant) {
            return false;
        }
        participant.detach_from(self.inner.id);

        debug!(
            room_id = %self.inner.id,
            participant = %participant.name(),
            members = members.len(),
            "Participant detached"
        );
        true
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("chatters", &self.chatters())
            .field("closed", &self.is_closed())
            .finish()
    }
}
