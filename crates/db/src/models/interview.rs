use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub applicant_id: ObjectId,
    pub scheduler_id: Option<ObjectId>,
    pub interviewer_id: Option<ObjectId>,
    pub date_time: DateTime,
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_link: String,
    #[serde(default)]
    pub status: InterviewStatus,
    pub report: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    #[default]
    Scheduled,
    Completed,
    Rejected,
}

impl Interview {
    pub const COLLECTION: &'static str = "interviews";

    pub fn involves(&self, user_id: ObjectId) -> bool {
        self.applicant_id == user_id
            || self.scheduler_id == Some(user_id)
            || self.interviewer_id == Some(user_id)
    }
}
