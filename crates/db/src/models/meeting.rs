use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime,
    pub end_time: DateTime,
    #[serde(default)]
    pub is_online: bool,
    /// Physical address, or the meeting link when online.
    #[serde(default)]
    pub location: String,
    pub organizer_id: Option<ObjectId>,
    #[serde(default)]
    pub participants: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Meeting {
    pub const COLLECTION: &'static str = "meetings";
}
