use std::sync::Arc;

use bson::oid::ObjectId;
use knowa_db::models::{Event, EventRole, RoleTier, RoomType, User};
use tracing::info;

use crate::dao::base::{DaoError, DaoResult};
use crate::dao::chat::ChatDao;
use crate::dao::event::{EventDao, NewEvent};

/// Tier a user needs to register in the given role.
pub fn tier_allows(role: EventRole, tier: RoleTier) -> bool {
    match role {
        EventRole::Participant => tier == RoleTier::Public,
        EventRole::Crew => matches!(tier, RoleTier::Member | RoleTier::Staff),
    }
}

#[derive(Clone)]
pub struct EventService {
    events: Arc<EventDao>,
    chat: Arc<ChatDao>,
}

impl EventService {
    pub fn new(events: Arc<EventDao>, chat: Arc<ChatDao>) -> Self {
        Self { events, chat }
    }

    /// Creates the event and its group chat.
    pub async fn create(&self, new_event: NewEvent) -> DaoResult<Event> {
        if new_event.title.trim().is_empty() {
            return Err(DaoError::Validation("Title is required".to_string()));
        }
        if new_event.end_time < new_event.start_time {
            return Err(DaoError::Validation(
                "End time must not be before start time".to_string(),
            ));
        }

        let organizer_id = new_event.organizer_id;
        let event = self.events.create(new_event).await?;
        let event_id = event.id.ok_or(DaoError::NotFound)?;
        self.chat
            .create_room(
                RoomType::Event,
                "",
                Some(format!("Group chat for {}", event.title)),
                Some(event_id),
                vec![organizer_id],
            )
            .await?;

        info!(%event_id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn join(&self, event_id: ObjectId, user: &User, role: EventRole) -> DaoResult<Event> {
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        if !tier_allows(role, user.tier()) {
            let message = match role {
                EventRole::Participant => "Only public users can join as participants",
                EventRole::Crew => "Only approved members can join as crew",
            };
            return Err(DaoError::Forbidden(message.to_string()));
        }
        self.events.join(event_id, user_id, role).await
    }
}
