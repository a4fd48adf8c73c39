use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use knowa_db::models::{Interview, InterviewStatus};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct InterviewDao {
    pub base: BaseDao<Interview>,
}

impl InterviewDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Interview::COLLECTION),
        }
    }

    /// Creates or overwrites the single interview keyed by applicant.
    pub async fn upsert_for_applicant(
        &self,
        applicant_id: ObjectId,
        scheduler_id: ObjectId,
        interviewer_id: Option<ObjectId>,
        date_time: DateTime,
        meeting_link: String,
    ) -> DaoResult<Interview> {
        self.base
            .upsert(
                doc! { "applicant_id": applicant_id },
                doc! {
                    "$set": {
                        "scheduler_id": scheduler_id,
                        "interviewer_id": interviewer_id,
                        "date_time": date_time,
                        "meeting_link": meeting_link,
                        "status": "SCHEDULED",
                    },
                    "$setOnInsert": {
                        "location": null,
                        "report": null,
                        "created_at": DateTime::now(),
                    },
                },
            )
            .await
    }

    pub async fn find_by_applicant(&self, applicant_id: ObjectId) -> DaoResult<Interview> {
        self.base
            .find_one(doc! { "applicant_id": applicant_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Stores the outcome; the report is only overwritten when given.
    pub async fn record_outcome(
        &self,
        interview_id: ObjectId,
        status: InterviewStatus,
        report: Option<&str>,
    ) -> DaoResult<Interview> {
        let mut set = doc! { "status": bson::to_bson(&status)? };
        if let Some(report) = report {
            set.insert("report", report);
        }
        self.base
            .find_one_and_update(doc! { "_id": interview_id }, doc! { "$set": set })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Finished interviews, newest first.
    pub async fn history(&self) -> DaoResult<Vec<Interview>> {
        self.base
            .find_many(
                doc! { "status": { "$in": ["COMPLETED", "REJECTED"] } },
                Some(doc! { "date_time": -1 }),
            )
            .await
    }

    pub async fn scheduled_for(&self, user_id: ObjectId) -> DaoResult<Vec<Interview>> {
        self.base
            .find_many(
                doc! {
                    "status": "SCHEDULED",
                    "$or": [
                        { "applicant_id": user_id },
                        { "scheduler_id": user_id },
                        { "interviewer_id": user_id },
                    ],
                },
                Some(doc! { "date_time": 1 }),
            )
            .await
    }
}
