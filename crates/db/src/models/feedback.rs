use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub subject: String,
    pub message: String,
    pub rating: Option<u8>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Feedback {
    pub const COLLECTION: &'static str = "feedback";
}
