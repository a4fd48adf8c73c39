use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use mongodb::options::ReturnDocument;
use knowa_db::models::{ChatRoom, Message, RoomType};
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ChatDao {
    pub rooms: BaseDao<ChatRoom>,
    pub messages: BaseDao<Message>,
}

impl ChatDao {
    pub fn new(db: &Database) -> Self {
        Self {
            rooms: BaseDao::new(db, ChatRoom::COLLECTION),
            messages: BaseDao::new(db, Message::COLLECTION),
        }
    }

    /// Returns the single room of an interview, creating it when absent.
    /// Existing participants are kept and the given ones are merged in.
    pub async fn get_or_create_interview_room(
        &self,
        interview_id: ObjectId,
        name: &str,
        participants: &[ObjectId],
    ) -> DaoResult<ChatRoom> {
        let room = self
            .rooms
            .upsert(
                doc! { "interview_id": interview_id },
                doc! {
                    "$setOnInsert": {
                        "type": "INTERVIEW",
                        "name": name,
                        "description": null,
                        "event_id": null,
                        "created_at": DateTime::now(),
                    },
                    "$addToSet": { "participants": { "$each": participants.to_vec() } },
                },
            )
            .await?;
        info!(%interview_id, room_id = ?room.id, "Interview room ready");
        Ok(room)
    }

    pub async fn create_room(
        &self,
        room_type: RoomType,
        name: &str,
        description: Option<String>,
        event_id: Option<ObjectId>,
        participants: Vec<ObjectId>,
    ) -> DaoResult<ChatRoom> {
        let now = DateTime::now();
        let room = ChatRoom {
            id: None,
            room_type,
            name: name.to_string(),
            description,
            event_id,
            interview_id: None,
            participants,
            created_at: now,
            updated_at: now,
        };
        let id = self.rooms.insert_one(&room).await?;
        self.rooms.find_by_id(id).await
    }

    /// Rooms listing the user directly or linked to one of `event_ids`.
    pub async fn rooms_for_user(
        &self,
        user_id: ObjectId,
        event_ids: &[ObjectId],
    ) -> DaoResult<Vec<ChatRoom>> {
        self.rooms
            .find_many(
                doc! {
                    "$or": [
                        { "participants": user_id },
                        { "event_id": { "$in": event_ids.to_vec() } },
                    ]
                },
                Some(doc! { "updated_at": -1 }),
            )
            .await
    }

    pub async fn send(
        &self,
        room_id: ObjectId,
        sender_id: ObjectId,
        content: String,
    ) -> DaoResult<Message> {
        let now = DateTime::now();
        let message = Message {
            id: None,
            room_id,
            sender_id,
            content,
            is_read: false,
            is_pinned: false,
            read_by: Vec::new(),
            timestamp: now,
            updated_at: now,
        };
        let id = self.messages.insert_one(&message).await?;
        // Bump the room so recent conversations list first
        self.rooms.update_by_id(room_id, doc! { "$set": {} }).await?;
        self.messages.find_by_id(id).await
    }

    pub async fn list_messages(&self, room_id: ObjectId) -> DaoResult<Vec<Message>> {
        self.messages
            .find_many(doc! { "room_id": room_id }, Some(doc! { "timestamp": 1 }))
            .await
    }

    pub async fn pinned(&self, room_id: ObjectId) -> DaoResult<Vec<Message>> {
        self.messages
            .find_many(
                doc! { "room_id": room_id, "is_pinned": true },
                Some(doc! { "timestamp": -1 }),
            )
            .await
    }

    pub async fn last_message(&self, room_id: ObjectId) -> DaoResult<Option<Message>> {
        Ok(self
            .messages
            .find_limited(
                doc! { "room_id": room_id },
                Some(doc! { "timestamp": -1 }),
                Some(1),
            )
            .await?
            .into_iter()
            .next())
    }

    pub async fn unread_count(&self, room_id: ObjectId, user_id: ObjectId) -> DaoResult<u64> {
        self.messages
            .count(doc! {
                "room_id": room_id,
                "sender_id": { "$ne": user_id },
                "read_by": { "$ne": user_id },
            })
            .await
    }

    pub async fn find_message(&self, message_id: ObjectId) -> DaoResult<Message> {
        self.messages.find_by_id(message_id).await
    }

    /// Flips `is_pinned` server side so concurrent toggles never lose a write.
    pub async fn toggle_pin(&self, message_id: ObjectId) -> DaoResult<Message> {
        self.messages
            .collection()
            .find_one_and_update(
                doc! { "_id": message_id },
                vec![doc! {
                    "$set": {
                        "is_pinned": { "$not": ["$is_pinned"] },
                        "updated_at": "$$NOW",
                    }
                }],
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Adds the reader to every message in the room they did not send and
    /// have not read yet. Returns how many messages changed.
    pub async fn add_reader_to_room(&self, room_id: ObjectId, reader_id: ObjectId) -> DaoResult<u64> {
        self.messages
            .update_many(
                doc! {
                    "room_id": room_id,
                    "sender_id": { "$ne": reader_id },
                    "read_by": { "$ne": reader_id },
                },
                doc! { "$addToSet": { "read_by": reader_id } },
            )
            .await
    }

    pub async fn not_fully_read(&self, room_id: ObjectId) -> DaoResult<Vec<Message>> {
        self.messages
            .find_many(doc! { "room_id": room_id, "is_read": false }, None)
            .await
    }

    /// Sets the terminal `is_read` flag. It is never cleared.
    pub async fn mark_fully_read(&self, message_ids: &[ObjectId]) -> DaoResult<u64> {
        if message_ids.is_empty() {
            return Ok(0);
        }
        self.messages
            .update_many(
                doc! { "_id": { "$in": message_ids.to_vec() }, "is_read": false },
                doc! { "$set": { "is_read": true } },
            )
            .await
    }
}
