use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    Badge, ChatRoom, Donation, Event, Faq, Feedback, Interview, Meeting, Message, Notification,
    User, UserProfile,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "username": 1 }),
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "member_status": 1 }),
            index(bson::doc! { "is_staff": 1 }),
        ],
    )
    .await?;

    // Profiles (one per user)
    create_indexes(
        db,
        UserProfile::COLLECTION,
        vec![index_unique(bson::doc! { "user_id": 1 })],
    )
    .await?;

    // Interviews (one per applicant)
    create_indexes(
        db,
        Interview::COLLECTION,
        vec![
            index_unique(bson::doc! { "applicant_id": 1 }),
            index(bson::doc! { "status": 1, "date_time": -1 }),
        ],
    )
    .await?;

    // Events
    create_indexes(
        db,
        Event::COLLECTION,
        vec![
            index(bson::doc! { "status": 1, "start_time": 1 }),
            index(bson::doc! { "participants": 1 }),
            index(bson::doc! { "crew": 1 }),
        ],
    )
    .await?;

    // Meetings
    create_indexes(
        db,
        Meeting::COLLECTION,
        vec![
            index(bson::doc! { "start_time": 1 }),
            index(bson::doc! { "participants": 1 }),
        ],
    )
    .await?;

    // Chat rooms (an interview owns at most one room)
    create_indexes(
        db,
        ChatRoom::COLLECTION,
        vec![
            IndexModel::builder()
                .keys(bson::doc! { "interview_id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(
                            bson::doc! { "interview_id": { "$type": "objectId" } },
                        )
                        .build(),
                )
                .build(),
            index(bson::doc! { "event_id": 1 }),
            index(bson::doc! { "participants": 1 }),
        ],
    )
    .await?;

    // Messages
    create_indexes(
        db,
        Message::COLLECTION,
        vec![
            index(bson::doc! { "room_id": 1, "timestamp": 1 }),
            index(bson::doc! { "room_id": 1, "is_pinned": 1, "timestamp": -1 }),
            index(bson::doc! { "room_id": 1, "is_read": 1 }),
        ],
    )
    .await?;

    // Donations
    create_indexes(
        db,
        Donation::COLLECTION,
        vec![
            index(bson::doc! { "user_id": 1, "submitted_at": -1 }),
            index(bson::doc! { "status": 1, "submitted_at": -1 }),
        ],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        Notification::COLLECTION,
        vec![
            index(bson::doc! { "recipient_id": 1, "created_at": -1 }),
            index(bson::doc! { "recipient_id": 1, "title": 1 }),
        ],
    )
    .await?;

    create_indexes(db, Badge::COLLECTION, vec![index_unique(bson::doc! { "name": 1 })]).await?;
    create_indexes(db, Faq::COLLECTION, vec![index(bson::doc! { "target_role": 1, "order": 1 })])
        .await?;
    create_indexes(db, Feedback::COLLECTION, vec![index(bson::doc! { "created_at": -1 })]).await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
