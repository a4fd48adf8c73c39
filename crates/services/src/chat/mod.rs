pub mod read_state;

use std::collections::BTreeSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use knowa_db::models::{ChatRoom, Event, Message, RoomType, User};
use tracing::{debug, info};

use crate::dao::base::{DaoError, DaoResult};
use crate::dao::chat::ChatDao;
use crate::dao::event::EventDao;
use crate::dao::user::UserDao;

pub use read_state::{ReadBreakdown, breakdown, can_pin, is_fully_read, required_audience};

/// A room together with the event it belongs to, if any.
#[derive(Debug, Clone)]
pub struct RoomContext {
    pub room: ChatRoom,
    pub event: Option<Event>,
}

impl RoomContext {
    pub fn audience(&self) -> BTreeSet<ObjectId> {
        required_audience(&self.room, self.event.as_ref())
    }

    pub fn display_name(&self) -> String {
        self.room
            .display_name(self.event.as_ref().map(|e| e.title.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub context: RoomContext,
    pub last_message: String,
    pub unread: u64,
}

#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub message: Message,
    pub read_by: Vec<User>,
    pub delivered_to: Vec<User>,
}

#[derive(Clone)]
pub struct ChatService {
    chat: Arc<ChatDao>,
    events: Arc<EventDao>,
    users: Arc<UserDao>,
}

impl ChatService {
    pub fn new(chat: Arc<ChatDao>, events: Arc<EventDao>, users: Arc<UserDao>) -> Self {
        Self {
            chat,
            events,
            users,
        }
    }

    pub async fn context(&self, room_id: ObjectId) -> DaoResult<RoomContext> {
        let room = self.chat.rooms.find_by_id(room_id).await?;
        let event = match room.event_id {
            Some(event_id) => match self.events.base.find_by_id(event_id).await {
                Ok(event) => Some(event),
                Err(DaoError::NotFound) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        Ok(RoomContext { room, event })
    }

    /// Room context when `user` is part of the audience or staff.
    pub async fn accessible(&self, room_id: ObjectId, user: &User) -> DaoResult<RoomContext> {
        let ctx = self.context(room_id).await?;
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        if user.is_admin() || ctx.audience().contains(&user_id) {
            Ok(ctx)
        } else {
            Err(DaoError::Forbidden("You are not a member of this chat".to_string()))
        }
    }

    pub async fn rooms_for(&self, user: &User) -> DaoResult<Vec<RoomSummary>> {
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        let event_ids: Vec<ObjectId> = self
            .events
            .involving(user_id)
            .await?
            .into_iter()
            .filter_map(|e| e.id)
            .collect();
        let rooms = self.chat.rooms_for_user(user_id, &event_ids).await?;

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let Some(room_id) = room.id else { continue };
            let context = self.context(room_id).await?;
            let last_message = match self.chat.last_message(room_id).await? {
                Some(msg) => {
                    let sender = self
                        .users
                        .base
                        .find_by_id(msg.sender_id)
                        .await
                        .map(|u| u.display_name())
                        .unwrap_or_default();
                    let preview: String = msg.content.chars().take(30).collect();
                    format!("{}: {}", sender, preview)
                }
                None => "No messages yet".to_string(),
            };
            let unread = self.chat.unread_count(room_id, user_id).await?;
            summaries.push(RoomSummary {
                context,
                last_message,
                unread,
            });
        }
        Ok(summaries)
    }

    /// Staff-created direct/general room.
    pub async fn create_room(
        &self,
        creator: &User,
        name: &str,
        description: Option<String>,
        mut participants: Vec<ObjectId>,
    ) -> DaoResult<ChatRoom> {
        let creator_id = creator.id.ok_or(DaoError::NotFound)?;
        if !participants.contains(&creator_id) {
            participants.push(creator_id);
        }
        let found = self.users.find_many_by_ids(&participants).await?;
        if found.len() != participants.len() {
            return Err(DaoError::Validation("Unknown participant id".to_string()));
        }
        self.chat
            .create_room(RoomType::Direct, name, description, None, participants)
            .await
    }

    pub async fn send_message(
        &self,
        room_id: ObjectId,
        sender: &User,
        content: &str,
    ) -> DaoResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DaoError::Validation("Message content is required".to_string()));
        }
        self.accessible(room_id, sender).await?;
        let sender_id = sender.id.ok_or(DaoError::NotFound)?;
        let message = self.chat.send(room_id, sender_id, content.to_string()).await?;
        debug!(%room_id, %sender_id, "Message sent");
        Ok(message)
    }

    pub async fn list_messages(&self, room_id: ObjectId, user: &User) -> DaoResult<Vec<Message>> {
        self.accessible(room_id, user).await?;
        self.chat.list_messages(room_id).await
    }

    pub async fn pinned(&self, room_id: ObjectId, user: &User) -> DaoResult<Vec<Message>> {
        self.accessible(room_id, user).await?;
        self.chat.pinned(room_id).await
    }

    /// Adds `reader` to every message they have not read, then flips
    /// `is_read` on each message whose audience (minus sender) has now read
    /// it. The audience is computed once per call. Returns the number of
    /// messages that gained the reader.
    pub async fn mark_room_read(&self, room_id: ObjectId, reader: &User) -> DaoResult<u64> {
        let ctx = self.accessible(room_id, reader).await?;
        let reader_id = reader.id.ok_or(DaoError::NotFound)?;

        let updated = self.chat.add_reader_to_room(room_id, reader_id).await?;

        let audience = ctx.audience();
        let newly_read: Vec<ObjectId> = self
            .chat
            .not_fully_read(room_id)
            .await?
            .iter()
            .filter(|m| is_fully_read(&audience, m))
            .filter_map(|m| m.id)
            .collect();
        let flipped = self.chat.mark_fully_read(&newly_read).await?;

        info!(%room_id, %reader_id, updated, flipped, "Room marked read");
        Ok(updated)
    }

    pub async fn toggle_pin(&self, message_id: ObjectId, actor: &User) -> DaoResult<Message> {
        let message = self.chat.find_message(message_id).await?;
        let ctx = self.context(message.room_id).await?;
        let actor_id = actor.id.ok_or(DaoError::NotFound)?;
        if !can_pin(&ctx.room, ctx.event.as_ref(), actor_id) {
            return Err(DaoError::Forbidden(
                "Only room members, organizers and crew can pin messages".to_string(),
            ));
        }
        self.chat.toggle_pin(message_id).await
    }

    /// Read receipts for a message. Only its sender may ask.
    pub async fn message_info(&self, message_id: ObjectId, requester: &User) -> DaoResult<MessageInfo> {
        let message = self.chat.find_message(message_id).await?;
        if requester.id != Some(message.sender_id) {
            return Err(DaoError::Forbidden(
                "Only the sender can view message info".to_string(),
            ));
        }
        let ctx = self.context(message.room_id).await?;
        let split = breakdown(&ctx.audience(), &message);

        let read_by = self.users.find_many_by_ids(&split.read_by).await?;
        let delivered_to = self.users.find_many_by_ids(&split.delivered_to).await?;
        Ok(MessageInfo {
            message,
            read_by,
            delivered_to,
        })
    }
}
