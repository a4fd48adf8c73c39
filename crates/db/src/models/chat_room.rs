use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type", default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub event_id: Option<ObjectId>,
    pub interview_id: Option<ObjectId>,
    #[serde(default)]
    pub participants: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    #[default]
    Event,
    Interview,
    #[serde(alias = "GENERAL")]
    Direct,
}

impl ChatRoom {
    pub const COLLECTION: &'static str = "chat_rooms";

    /// Explicit name, then the linked event's title, then a generic label.
    pub fn display_name(&self, event_title: Option<&str>) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        if let Some(title) = event_title {
            return title.to_string();
        }
        match self.room_type {
            RoomType::Interview => "Interview Chat".to_string(),
            RoomType::Event => "Event Chat".to_string(),
            RoomType::Direct => "Direct Message".to_string(),
        }
    }
}
