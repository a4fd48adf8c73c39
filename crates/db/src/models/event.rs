use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_time: DateTime,
    pub end_time: DateTime,
    pub image: Option<String>,
    pub organizer_id: Option<ObjectId>,
    #[serde(default)]
    pub participants: Vec<ObjectId>,
    #[serde(default)]
    pub crew: Vec<ObjectId>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default = "default_capacity_participants")]
    pub capacity_participants: u32,
    #[serde(default = "default_capacity_crew")]
    pub capacity_crew: u32,
    pub calendar_link: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Completed,
    Cancelled,
}

/// The two disjoint registration lists on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRole {
    Participant,
    Crew,
}

impl EventRole {
    pub fn field(&self) -> &'static str {
        match self {
            EventRole::Participant => "participants",
            EventRole::Crew => "crew",
        }
    }

    pub fn capacity_field(&self) -> &'static str {
        match self {
            EventRole::Participant => "capacity_participants",
            EventRole::Crew => "capacity_crew",
        }
    }
}

pub fn default_capacity_participants() -> u32 {
    50
}

pub fn default_capacity_crew() -> u32 {
    10
}

impl Event {
    pub const COLLECTION: &'static str = "events";

    pub fn is_organizer_or_crew(&self, user_id: ObjectId) -> bool {
        self.organizer_id == Some(user_id) || self.crew.contains(&user_id)
    }

    pub fn involves(&self, user_id: ObjectId) -> bool {
        self.is_organizer_or_crew(user_id) || self.participants.contains(&user_id)
    }
}
