use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use knowa_db::models::{Event, EventRole, EventStatus, Meeting};
use serde::Deserialize;
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct EventDao {
    pub base: BaseDao<Event>,
    pub meetings: BaseDao<Meeting>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime,
    pub end_time: DateTime,
    pub organizer_id: ObjectId,
    pub status: EventStatus,
    pub capacity_participants: u32,
    pub capacity_crew: u32,
    pub calendar_link: Option<String>,
    pub is_online: bool,
}

/// Partial event update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub status: Option<EventStatus>,
    pub capacity_participants: Option<u32>,
    pub capacity_crew: Option<u32>,
    pub calendar_link: Option<String>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub title: String,
    pub description: String,
    pub start_time: DateTime,
    pub end_time: DateTime,
    pub is_online: bool,
    pub location: String,
    pub organizer_id: ObjectId,
    pub participants: Vec<ObjectId>,
}

impl EventDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Event::COLLECTION),
            meetings: BaseDao::new(db, Meeting::COLLECTION),
        }
    }

    pub async fn create(&self, new_event: NewEvent) -> DaoResult<Event> {
        let now = DateTime::now();
        let event = Event {
            id: None,
            title: new_event.title,
            description: new_event.description,
            location: new_event.location,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            image: None,
            organizer_id: Some(new_event.organizer_id),
            participants: Vec::new(),
            crew: Vec::new(),
            status: new_event.status,
            capacity_participants: new_event.capacity_participants,
            capacity_crew: new_event.capacity_crew,
            calendar_link: new_event.calendar_link,
            is_online: new_event.is_online,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&event).await?;
        self.base.find_by_id(id).await
    }

    pub async fn update(&self, event_id: ObjectId, update: &EventUpdate) -> DaoResult<Event> {
        let mut set = Document::new();
        if let Some(title) = &update.title {
            set.insert("title", title.as_str());
        }
        if let Some(description) = &update.description {
            set.insert("description", description.as_str());
        }
        if let Some(location) = &update.location {
            set.insert("location", location.as_str());
        }
        if let Some(start) = update.start_time {
            set.insert("start_time", DateTime::from_chrono(start));
        }
        if let Some(end) = update.end_time {
            set.insert("end_time", DateTime::from_chrono(end));
        }
        if let Some(status) = update.status {
            set.insert("status", bson::to_bson(&status)?);
        }
        if let Some(cap) = update.capacity_participants {
            set.insert("capacity_participants", cap as i64);
        }
        if let Some(cap) = update.capacity_crew {
            set.insert("capacity_crew", cap as i64);
        }
        if let Some(link) = &update.calendar_link {
            set.insert("calendar_link", link.as_str());
        }
        if let Some(online) = update.is_online {
            set.insert("is_online", online);
        }

        if !set.is_empty() {
            self.base.update_by_id(event_id, doc! { "$set": set }).await?;
        }
        self.base.find_by_id(event_id).await
    }

    pub async fn delete(&self, event_id: ObjectId) -> DaoResult<bool> {
        Ok(self.base.hard_delete(doc! { "_id": event_id }).await? > 0)
    }

    /// Staff see everything; everyone else sees upcoming published events.
    pub async fn list_visible(&self, is_staff: bool) -> DaoResult<Vec<Event>> {
        let filter = if is_staff {
            doc! {}
        } else {
            doc! {
                "status": "PUBLISHED",
                "start_time": { "$gte": DateTime::now() },
            }
        };
        self.base.find_many(filter, Some(doc! { "start_time": 1 })).await
    }

    pub async fn upcoming_published(&self, limit: i64) -> DaoResult<Vec<Event>> {
        self.base
            .find_limited(
                doc! { "status": "PUBLISHED", "start_time": { "$gte": DateTime::now() } },
                Some(doc! { "start_time": 1 }),
                Some(limit),
            )
            .await
    }

    pub async fn starting_between(&self, from: DateTime, to: DateTime) -> DaoResult<Vec<Event>> {
        self.base
            .find_many(
                doc! { "status": "PUBLISHED", "start_time": { "$gt": from, "$lte": to } },
                Some(doc! { "start_time": 1 }),
            )
            .await
    }

    /// Events where the user organises, crews or participates.
    pub async fn involving(&self, user_id: ObjectId) -> DaoResult<Vec<Event>> {
        self.base
            .find_many(
                doc! {
                    "$or": [
                        { "organizer_id": user_id },
                        { "crew": user_id },
                        { "participants": user_id },
                    ]
                },
                Some(doc! { "start_time": 1 }),
            )
            .await
    }

    pub async fn count_joined(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "$or": [ { "participants": user_id }, { "crew": user_id } ] })
            .await
    }

    pub async fn count_active(&self) -> DaoResult<u64> {
        self.base
            .count(doc! { "status": "PUBLISHED", "end_time": { "$gte": DateTime::now() } })
            .await
    }

    /// Adds the user to the role list in a single conditional update: the event
    /// must be published, the user must not be registered in either list and
    /// the list must be below its capacity. On failure the event is re-read to
    /// report which condition failed.
    pub async fn join(
        &self,
        event_id: ObjectId,
        user_id: ObjectId,
        role: EventRole,
    ) -> DaoResult<Event> {
        let field = role.field();
        let filter = doc! {
            "_id": event_id,
            "status": "PUBLISHED",
            "participants": { "$ne": user_id },
            "crew": { "$ne": user_id },
            "$expr": {
                "$lt": [
                    { "$size": { "$ifNull": [ format!("${}", field), [] ] } },
                    format!("${}", role.capacity_field()),
                ]
            },
        };

        let mut add = Document::new();
        add.insert(field, user_id);

        if let Some(event) = self
            .base
            .find_one_and_update(filter, doc! { "$addToSet": add })
            .await?
        {
            info!(%event_id, %user_id, role = field, "Joined event");
            return Ok(event);
        }

        let event = self.base.find_by_id(event_id).await?;
        if event.status != EventStatus::Published {
            return Err(DaoError::Validation(
                "Event is not open for registration".to_string(),
            ));
        }
        if event.participants.contains(&user_id) || event.crew.contains(&user_id) {
            return Err(DaoError::Conflict("Already joined this event".to_string()));
        }
        Err(DaoError::Capacity(format!("The {} list is full", field)))
    }

    pub async fn create_meeting(&self, new_meeting: NewMeeting) -> DaoResult<Meeting> {
        let now = DateTime::now();
        let meeting = Meeting {
            id: None,
            title: new_meeting.title,
            description: new_meeting.description,
            start_time: new_meeting.start_time,
            end_time: new_meeting.end_time,
            is_online: new_meeting.is_online,
            location: new_meeting.location,
            organizer_id: Some(new_meeting.organizer_id),
            participants: new_meeting.participants,
            created_at: now,
            updated_at: now,
        };
        let id = self.meetings.insert_one(&meeting).await?;
        self.meetings.find_by_id(id).await
    }

    pub async fn meetings_involving(&self, user_id: ObjectId) -> DaoResult<Vec<Meeting>> {
        self.meetings
            .find_many(
                doc! { "$or": [ { "organizer_id": user_id }, { "participants": user_id } ] },
                Some(doc! { "start_time": 1 }),
            )
            .await
    }

    pub async fn meetings_starting_between(
        &self,
        from: DateTime,
        to: DateTime,
    ) -> DaoResult<Vec<Meeting>> {
        self.meetings
            .find_many(
                doc! { "start_time": { "$gt": from, "$lte": to } },
                Some(doc! { "start_time": 1 }),
            )
            .await
    }
}
