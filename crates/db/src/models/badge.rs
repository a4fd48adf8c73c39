use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    pub criteria_type: BadgeCriteria,
    pub threshold: u32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeCriteria {
    EventsJoined,
    DonationsMade,
}

/// Live counters badges are evaluated against.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ActivityCounters {
    pub events_joined: u64,
    pub donations_made: u64,
}

impl Badge {
    pub const COLLECTION: &'static str = "badges";

    pub fn is_earned(&self, counters: &ActivityCounters) -> bool {
        let value = match self.criteria_type {
            BadgeCriteria::EventsJoined => counters.events_joined,
            BadgeCriteria::DonationsMade => counters.donations_made,
        };
        value >= u64::from(self.threshold)
    }
}
