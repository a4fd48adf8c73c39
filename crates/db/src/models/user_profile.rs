use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Membership application data, one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub full_name: Option<String>,
    pub ic_number: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub education: Option<String>,
    pub motivation: Option<String>,
    /// Storage keys of uploaded documents.
    pub resume: Option<String>,
    pub identification: Option<String>,
    pub payment_receipt: Option<String>,
    pub rejection_reason: Option<String>,
    pub application_date: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl UserProfile {
    pub const COLLECTION: &'static str = "user_profiles";

    pub fn empty(user_id: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            user_id,
            full_name: None,
            ic_number: None,
            occupation: None,
            address: None,
            education: None,
            motivation: None,
            resume: None,
            identification: None,
            payment_receipt: None,
            rejection_reason: None,
            application_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
