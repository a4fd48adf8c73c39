//! Pure read-receipt rules for chat messages.

use std::collections::BTreeSet;

use bson::oid::ObjectId;
use knowa_db::models::{ChatRoom, Event, Message};

/// Everyone whose receipt counts towards "read by everyone": the room's
/// explicit participants plus, for event rooms, the organizer, crew and
/// participants of the event.
pub fn required_audience(room: &ChatRoom, event: Option<&Event>) -> BTreeSet<ObjectId> {
    let mut audience: BTreeSet<ObjectId> = room.participants.iter().copied().collect();
    if let Some(event) = event {
        audience.extend(event.organizer_id);
        audience.extend(event.crew.iter().copied());
        audience.extend(event.participants.iter().copied());
    }
    audience
}

/// Readers still missing for `message`. The sender never has to read their own message.
pub fn pending_readers(audience: &BTreeSet<ObjectId>, message: &Message) -> Vec<ObjectId> {
    audience
        .iter()
        .filter(|id| **id != message.sender_id && !message.read_by.contains(id))
        .copied()
        .collect()
}

pub fn is_fully_read(audience: &BTreeSet<ObjectId>, message: &Message) -> bool {
    pending_readers(audience, message).is_empty()
}

/// Audience of a message split by whether each member has read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadBreakdown {
    pub read_by: Vec<ObjectId>,
    pub delivered_to: Vec<ObjectId>,
}

pub fn breakdown(audience: &BTreeSet<ObjectId>, message: &Message) -> ReadBreakdown {
    let (read_by, delivered_to): (Vec<ObjectId>, Vec<ObjectId>) = audience
        .iter()
        .copied()
        .filter(|id| *id != message.sender_id)
        .partition(|id| message.read_by.contains(id));
    ReadBreakdown {
        read_by,
        delivered_to,
    }
}

/// Room participants may pin; in event rooms so may the organizer and crew.
pub fn can_pin(room: &ChatRoom, event: Option<&Event>, actor: ObjectId) -> bool {
    room.participants.contains(&actor) || event.is_some_and(|e| e.is_organizer_or_crew(actor))
}
