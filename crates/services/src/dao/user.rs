use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use knowa_db::models::{MemberStatus, User, UserProfile};
use serde::Deserialize;
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
    pub profiles: BaseDao<UserProfile>,
}

/// Fields accepted when creating an account.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub interests: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Application form fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub ic_number: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub education: Option<String>,
    pub motivation: Option<String>,
    pub resume: Option<String>,
    pub identification: Option<String>,
    pub payment_receipt: Option<String>,
}

impl ProfileUpdate {
    fn to_set_doc(&self) -> Document {
        let mut set = Document::new();
        let fields = [
            ("full_name", &self.full_name),
            ("ic_number", &self.ic_number),
            ("occupation", &self.occupation),
            ("address", &self.address),
            ("education", &self.education),
            ("motivation", &self.motivation),
            ("resume", &self.resume),
            ("identification", &self.identification),
            ("payment_receipt", &self.payment_receipt),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                set.insert(key, v.clone());
            }
        }
        set
    }
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
            profiles: BaseDao::new(db, UserProfile::COLLECTION),
        }
    }

    /// Inserts the user and its empty profile.
    pub async fn create(&self, new_user: NewUser) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            interests: new_user.interests,
            password_hash: Some(new_user.password_hash),
            member_status: MemberStatus::Public,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            is_active: true,
            tac_code: None,
            tac_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.profiles.insert_one(&UserProfile::empty(id)).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "username": username, "is_active": true })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email, "is_active": true })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Profile for the user, created on first access when missing.
    pub async fn profile(&self, user_id: ObjectId) -> DaoResult<UserProfile> {
        if let Some(profile) = self.profiles.find_one(doc! { "user_id": user_id }).await? {
            return Ok(profile);
        }
        match self.profiles.insert_one(&UserProfile::empty(user_id)).await {
            Ok(_) | Err(DaoError::DuplicateKey(_)) => {}
            Err(e) => return Err(e),
        }
        self.profiles
            .find_one(doc! { "user_id": user_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: ObjectId,
        update: &ProfileUpdate,
    ) -> DaoResult<UserProfile> {
        // Make sure the row exists before a partial $set
        self.profile(user_id).await?;
        let set = update.to_set_doc();
        if !set.is_empty() {
            self.profiles
                .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
                .await?;
        }
        self.profile(user_id).await
    }

    pub async fn set_profile_field(
        &self,
        user_id: ObjectId,
        field: &str,
        value: impl Into<bson::Bson>,
    ) -> DaoResult<bool> {
        self.profile(user_id).await?;
        let mut set = Document::new();
        set.insert(field, value.into());
        self.profiles
            .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
            .await
    }

    pub async fn store_tac(
        &self,
        user_id: ObjectId,
        code: &str,
        expires_at: DateTime,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! { "$set": { "tac_code": code, "tac_expires_at": expires_at } },
            )
            .await
    }

    /// Clears a matching, unexpired code in one step so it cannot be replayed.
    /// `last_login_at` is stamped only when `is_login` is set.
    pub async fn consume_tac(
        &self,
        mut filter: Document,
        code: &str,
        is_login: bool,
    ) -> DaoResult<Option<User>> {
        filter.insert("tac_code", code);
        filter.insert("tac_expires_at", doc! { "$gt": DateTime::now() });
        let mut update = doc! { "$unset": { "tac_code": "", "tac_expires_at": "" } };
        if is_login {
            update.insert("$set", doc! { "last_login_at": DateTime::now() });
        }
        self.base.find_one_and_update(filter, update).await
    }

    pub async fn set_password(&self, user_id: ObjectId, password_hash: &str) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "password_hash": password_hash } })
            .await
    }

    /// Moves `member_status` to `to` when the current status is in `from`
    /// (`None` accepts any status). The check and the write are one update.
    pub async fn transition(
        &self,
        user_id: ObjectId,
        from: Option<&[MemberStatus]>,
        to: MemberStatus,
        attempted: &str,
    ) -> DaoResult<User> {
        let mut filter = doc! { "_id": user_id };
        if let Some(allowed) = from {
            let allowed: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
            filter.insert("member_status", doc! { "$in": allowed });
        }

        let updated = self
            .base
            .find_one_and_update(filter, doc! { "$set": { "member_status": to.as_str() } })
            .await?;

        match updated {
            Some(user) => {
                info!(%user_id, to = %to, attempted, "Member status changed");
                Ok(user)
            }
            None => {
                let current = self.base.find_by_id(user_id).await?;
                Err(DaoError::InvalidTransition {
                    current: current.member_status.to_string(),
                    attempted: attempted.to_string(),
                })
            }
        }
    }

    pub async fn list_by_status(&self, status: MemberStatus) -> DaoResult<Vec<User>> {
        self.base
            .find_many(
                doc! { "member_status": status.as_str() },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    /// Approved applicants who have uploaded a payment receipt.
    pub async fn pending_payment(&self) -> DaoResult<Vec<User>> {
        let with_receipt = self
            .profiles
            .find_many(doc! { "payment_receipt": { "$ne": null } }, None)
            .await?;
        let ids: Vec<ObjectId> = with_receipt.into_iter().map(|p| p.user_id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(
                doc! {
                    "_id": { "$in": ids },
                    "member_status": MemberStatus::ApprovedUnpaid.as_str(),
                },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn staff(&self) -> DaoResult<Vec<User>> {
        self.base
            .find_many(doc! { "is_staff": true }, Some(doc! { "username": 1 }))
            .await
    }

    pub async fn staff_ids(&self) -> DaoResult<Vec<ObjectId>> {
        Ok(self.staff().await?.into_iter().filter_map(|u| u.id).collect())
    }

    pub async fn find_many_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": ids.to_vec() } }, Some(doc! { "username": 1 }))
            .await
    }

    pub async fn count_status(&self, status: MemberStatus) -> DaoResult<u64> {
        self.base.count(doc! { "member_status": status.as_str() }).await
    }

    /// Members plus staff.
    pub async fn count_members(&self) -> DaoResult<u64> {
        self.base
            .count(doc! {
                "$or": [
                    { "member_status": MemberStatus::Member.as_str() },
                    { "is_staff": true },
                ]
            })
            .await
    }
}
