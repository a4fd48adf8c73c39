use bson::{doc, DateTime};
use mongodb::Database;
use knowa_db::models::{Faq, FaqAudience};

use super::base::{BaseDao, DaoResult};

pub struct FaqDao {
    pub base: BaseDao<Faq>,
}

impl FaqDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Faq::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        question: String,
        answer: String,
        target_role: FaqAudience,
        order: i32,
    ) -> DaoResult<Faq> {
        let now = DateTime::now();
        let faq = Faq {
            id: None,
            question,
            answer,
            target_role,
            order,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&faq).await?;
        self.base.find_by_id(id).await
    }

    pub async fn for_audiences(&self, audiences: &[FaqAudience]) -> DaoResult<Vec<Faq>> {
        let roles: Vec<&str> = audiences.iter().map(|a| a.as_str()).collect();
        self.base
            .find_many(
                doc! { "target_role": { "$in": roles } },
                Some(doc! { "order": 1, "created_at": 1 }),
            )
            .await
    }

    pub async fn all(&self) -> DaoResult<Vec<Faq>> {
        self.base
            .find_many(doc! {}, Some(doc! { "order": 1, "created_at": 1 }))
            .await
    }
}
