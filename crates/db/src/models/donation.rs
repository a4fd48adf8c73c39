use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub amount: f64,
    /// Storage key of the uploaded receipt.
    pub receipt: String,
    #[serde(default)]
    pub status: DonationStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "PENDING",
            DonationStatus::Approved => "APPROVED",
            DonationStatus::Rejected => "REJECTED",
        }
    }
}

impl Donation {
    pub const COLLECTION: &'static str = "donations";
}
