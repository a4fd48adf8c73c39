use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub room_id: ObjectId,
    pub sender_id: ObjectId,
    pub content: String,
    /// True once every required reader is in `read_by`. Never reset.
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub read_by: Vec<ObjectId>,
    pub timestamp: DateTime,
    pub updated_at: DateTime,
}

impl Message {
    pub const COLLECTION: &'static str = "messages";
}
