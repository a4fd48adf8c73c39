use bson::{doc, oid::ObjectId, DateTime};
use futures::TryStreamExt;
use mongodb::Database;
use knowa_db::models::{Donation, DonationStatus};
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct DonationDao {
    pub base: BaseDao<Donation>,
}

impl DonationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Donation::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        user_id: Option<ObjectId>,
        amount: f64,
        receipt: String,
    ) -> DaoResult<Donation> {
        let now = DateTime::now();
        let donation = Donation {
            id: None,
            user_id,
            amount,
            receipt,
            status: DonationStatus::Pending,
            rejection_reason: None,
            submitted_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&donation).await?;
        self.base.find_by_id(id).await
    }

    pub async fn for_user(&self, user_id: ObjectId) -> DaoResult<Vec<Donation>> {
        self.base
            .find_many(doc! { "user_id": user_id }, Some(doc! { "submitted_at": -1 }))
            .await
    }

    pub async fn pending(&self) -> DaoResult<Vec<Donation>> {
        self.base
            .find_many(
                doc! { "status": DonationStatus::Pending.as_str() },
                Some(doc! { "submitted_at": 1 }),
            )
            .await
    }

    /// Decides a pending donation. Anything already decided is rejected
    /// with `InvalidTransition`.
    pub async fn decide(
        &self,
        donation_id: ObjectId,
        to: DonationStatus,
        reason: Option<&str>,
    ) -> DaoResult<Donation> {
        let updated = self
            .base
            .find_one_and_update(
                doc! { "_id": donation_id, "status": DonationStatus::Pending.as_str() },
                doc! { "$set": { "status": to.as_str(), "rejection_reason": reason } },
            )
            .await?;

        match updated {
            Some(donation) => {
                info!(%donation_id, status = to.as_str(), "Donation decided");
                Ok(donation)
            }
            None => {
                let current = self.base.find_by_id(donation_id).await?;
                Err(DaoError::InvalidTransition {
                    current: current.status.as_str().to_string(),
                    attempted: to.as_str().to_string(),
                })
            }
        }
    }

    /// Replaces the receipt of the user's most recent donation when it was
    /// rejected, putting it back in the review queue.
    pub async fn resubmit_latest(&self, user_id: ObjectId, receipt: String) -> DaoResult<Donation> {
        let latest = self
            .base
            .find_limited(
                doc! { "user_id": user_id },
                Some(doc! { "submitted_at": -1 }),
                Some(1),
            )
            .await?
            .into_iter()
            .next()
            .ok_or(DaoError::NotFound)?;
        let donation_id = latest.id.ok_or(DaoError::NotFound)?;

        self.base
            .find_one_and_update(
                doc! { "_id": donation_id, "status": DonationStatus::Rejected.as_str() },
                doc! {
                    "$set": {
                        "receipt": receipt,
                        "status": DonationStatus::Pending.as_str(),
                        "rejection_reason": null,
                        "submitted_at": DateTime::now(),
                    }
                },
            )
            .await?
            .ok_or_else(|| DaoError::InvalidTransition {
                current: latest.status.as_str().to_string(),
                attempted: "resubmit".to_string(),
            })
    }

    async fn sum_approved(&self, mut filter: bson::Document) -> DaoResult<f64> {
        filter.insert("status", DonationStatus::Approved.as_str());
        let mut cursor = self
            .base
            .collection()
            .aggregate(vec![
                doc! { "$match": filter },
                doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
            ])
            .await?;

        let total = match cursor.try_next().await? {
            Some(row) => match row.get("total") {
                Some(bson::Bson::Double(v)) => *v,
                Some(bson::Bson::Int32(v)) => f64::from(*v),
                Some(bson::Bson::Int64(v)) => *v as f64,
                _ => 0.0,
            },
            None => 0.0,
        };
        Ok(total)
    }

    pub async fn total_approved(&self) -> DaoResult<f64> {
        self.sum_approved(doc! {}).await
    }

    pub async fn approved_since(&self, since: DateTime) -> DaoResult<f64> {
        self.sum_approved(doc! { "submitted_at": { "$gte": since } }).await
    }

    pub async fn count_approved_for(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "user_id": user_id, "status": DonationStatus::Approved.as_str() })
            .await
    }
}
