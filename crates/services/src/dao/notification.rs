use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use knowa_db::models::{Notification, NotificationType};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        recipient_id: ObjectId,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> DaoResult<Notification> {
        let now = DateTime::now();
        let notification = Notification {
            id: None,
            recipient_id,
            title: title.to_string(),
            message: message.to_string(),
            notification_type,
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&notification).await?;
        self.base.find_by_id(id).await
    }

    pub async fn for_recipient(&self, recipient_id: ObjectId) -> DaoResult<Vec<Notification>> {
        self.base
            .find_many(
                doc! { "recipient_id": recipient_id },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    pub async fn mark_read(&self, id: ObjectId, recipient_id: ObjectId) -> DaoResult<Notification> {
        self.base
            .find_one_and_update(
                doc! { "_id": id, "recipient_id": recipient_id },
                doc! { "$set": { "is_read": true } },
            )
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn exists_with_title(&self, recipient_id: ObjectId, title: &str) -> DaoResult<bool> {
        self.base
            .exists(doc! { "recipient_id": recipient_id, "title": title })
            .await
    }
}
