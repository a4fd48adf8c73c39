use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use knowa_db::models::Feedback;

use super::base::{BaseDao, DaoResult};

pub struct FeedbackDao {
    pub base: BaseDao<Feedback>,
}

impl FeedbackDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Feedback::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        user_id: ObjectId,
        subject: String,
        message: String,
        rating: Option<u8>,
    ) -> DaoResult<Feedback> {
        let now = DateTime::now();
        let feedback = Feedback {
            id: None,
            user_id,
            subject,
            message,
            rating,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&feedback).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self) -> DaoResult<Vec<Feedback>> {
        self.base
            .find_many(doc! {}, Some(doc! { "created_at": -1 }))
            .await
    }
}
