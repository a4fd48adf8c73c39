use bson::{doc, DateTime};
use mongodb::Database;
use knowa_db::models::{Badge, BadgeCriteria};

use super::base::{BaseDao, DaoResult};

pub struct BadgeDao {
    pub base: BaseDao<Badge>,
}

impl BadgeDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Badge::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        description: String,
        icon: Option<String>,
        criteria_type: BadgeCriteria,
        threshold: u32,
    ) -> DaoResult<Badge> {
        let now = DateTime::now();
        let badge = Badge {
            id: None,
            name,
            description,
            icon,
            criteria_type,
            threshold,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&badge).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self) -> DaoResult<Vec<Badge>> {
        self.base
            .find_many(doc! {}, Some(doc! { "threshold": 1, "name": 1 }))
            .await
    }
}
