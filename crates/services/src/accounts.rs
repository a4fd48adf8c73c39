use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use knowa_config::AdminSettings;
use knowa_db::models::{ActivityCounters, Badge, User};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{AuthError, AuthService};
use crate::dao::badge::BadgeDao;
use crate::dao::base::{DaoError, DaoResult};
use crate::dao::donation::DonationDao;
use crate::dao::event::EventDao;
use crate::dao::interview::InterviewDao;
use crate::dao::user::{NewUser, UserDao};
use crate::mail::MailService;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Dao(#[from] DaoError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacPurpose {
    Login,
    PasswordReset,
}

impl TacPurpose {
    fn label(&self) -> &'static str {
        match self {
            TacPurpose::Login => "login",
            TacPurpose::PasswordReset => "password reset",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleKind {
    Interview,
    Event,
    Meeting,
}

/// One row of a user's merged schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    pub title: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub location: String,
    pub meeting_link: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<UserDao>,
    interviews: Arc<InterviewDao>,
    events: Arc<EventDao>,
    donations: Arc<DonationDao>,
    badges: Arc<BadgeDao>,
    auth: Arc<AuthService>,
    mail: MailService,
}

impl AccountService {
    pub fn new(
        users: Arc<UserDao>,
        interviews: Arc<InterviewDao>,
        events: Arc<EventDao>,
        donations: Arc<DonationDao>,
        badges: Arc<BadgeDao>,
        auth: Arc<AuthService>,
        mail: MailService,
    ) -> Self {
        Self {
            users,
            interviews,
            events,
            donations,
            badges,
            auth,
            mail,
        }
    }

    /// Creates the account together with its profile and sends the welcome mail.
    pub async fn register(&self, mut new_user: NewUser, password: &str) -> AccountResult<User> {
        new_user.password_hash = self.auth.hash_password(password)?;
        let user = self.users.create(new_user).await?;
        info!(user_id = ?user.id, username = %user.username, "User registered");
        self.mail.send_welcome(&user.email, &user.display_name());
        Ok(user)
    }

    /// Replaces any previous code with a fresh one and mails it.
    pub async fn issue_tac(&self, user: &User, purpose: TacPurpose) -> AccountResult<()> {
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        let (code, expires_at) = self.auth.generate_tac();
        self.users.store_tac(user_id, &code, expires_at).await?;
        self.mail
            .send_tac(&user.email, &user.display_name(), &code, purpose.label());
        Ok(())
    }

    /// Username/password check for the first login step.
    pub async fn check_credentials(&self, username: &str, password: &str) -> AccountResult<User> {
        let user = match self.users.find_by_username(username).await {
            Ok(user) => user,
            Err(DaoError::NotFound) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e.into()),
        };
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.auth.verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(user)
    }

    /// Consumes a valid code for the user matched by `filter`.
    pub async fn consume_tac(
        &self,
        filter: bson::Document,
        code: &str,
        purpose: TacPurpose,
    ) -> AccountResult<User> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InvalidTac.into());
        }
        self.users
            .consume_tac(filter, code, purpose == TacPurpose::Login)
            .await?
            .ok_or_else(|| AuthError::InvalidTac.into())
    }

    pub async fn reset_password(&self, email: &str, code: &str, password: &str) -> AccountResult<()> {
        let user = self
            .consume_tac(doc! { "email": email }, code, TacPurpose::PasswordReset)
            .await?;
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        let hash = self.auth.hash_password(password)?;
        self.users.set_password(user_id, &hash).await?;
        info!(%user_id, "Password reset");
        Ok(())
    }

    /// Creates the configured superuser once. Existing accounts are left alone.
    pub async fn ensure_superuser(&self, admin: &AdminSettings) -> AccountResult<Option<User>> {
        let (Some(username), Some(password)) = (&admin.username, &admin.password) else {
            return Ok(None);
        };
        if self
            .users
            .base
            .exists(doc! { "username": username.as_str() })
            .await?
        {
            return Ok(None);
        }

        let email = admin
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@localhost", username));
        let user = self
            .users
            .create(NewUser {
                username: username.clone(),
                email,
                first_name: "Admin".to_string(),
                password_hash: self.auth.hash_password(password)?,
                is_staff: true,
                is_superuser: true,
                ..Default::default()
            })
            .await?;
        warn!(username = %user.username, "Superuser created from settings");
        Ok(Some(user))
    }

    pub async fn counters(&self, user_id: ObjectId) -> DaoResult<ActivityCounters> {
        Ok(ActivityCounters {
            events_joined: self.events.count_joined(user_id).await?,
            donations_made: self.donations.count_approved_for(user_id).await?,
        })
    }

    pub async fn earned_badges(&self, counters: &ActivityCounters) -> DaoResult<Vec<Badge>> {
        Ok(self
            .badges
            .list()
            .await?
            .into_iter()
            .filter(|b| b.is_earned(counters))
            .collect())
    }

    /// Scheduled interviews, events and meetings for the user, by start time.
    /// Staff see every event.
    pub async fn schedule(&self, user: &User) -> DaoResult<Vec<ScheduleItem>> {
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        let mut items = Vec::new();

        for interview in self.interviews.scheduled_for(user_id).await? {
            let title = if interview.applicant_id == user_id {
                let host_id = interview.interviewer_id.or(interview.scheduler_id);
                let host = match host_id {
                    Some(id) => self.users.base.find_by_id(id).await.ok(),
                    None => None,
                };
                let host = host.map(|u| u.display_name()).unwrap_or_else(|| "Admin".to_string());
                format!("Interview with {}", host)
            } else {
                let applicant = self.users.base.find_by_id(interview.applicant_id).await?;
                format!("Interview: {}", applicant.display_name())
            };
            items.push(ScheduleItem {
                id: interview.id.map(|id| id.to_hex()).unwrap_or_default(),
                kind: ScheduleKind::Interview,
                title,
                start_time: interview.date_time.to_chrono(),
                location: interview.location.unwrap_or_default(),
                meeting_link: interview.meeting_link,
                description: "Interview session".to_string(),
                applicant_id: Some(interview.applicant_id.to_hex()),
            });
        }

        let events = if user.is_staff {
            self.events.base.find_many(doc! {}, None).await?
        } else {
            self.events.involving(user_id).await?
        };
        for event in events {
            items.push(ScheduleItem {
                id: event.id.map(|id| id.to_hex()).unwrap_or_default(),
                kind: ScheduleKind::Event,
                title: event.title,
                start_time: event.start_time.to_chrono(),
                location: event.location,
                meeting_link: String::new(),
                description: event.description,
                applicant_id: None,
            });
        }

        for meeting in self.events.meetings_involving(user_id).await? {
            let (location, meeting_link) = if meeting.is_online {
                ("Online".to_string(), meeting.location)
            } else {
                (meeting.location, String::new())
            };
            items.push(ScheduleItem {
                id: meeting.id.map(|id| id.to_hex()).unwrap_or_default(),
                kind: ScheduleKind::Meeting,
                title: meeting.title,
                start_time: meeting.start_time.to_chrono(),
                location,
                meeting_link,
                description: meeting.description,
                applicant_id: None,
            });
        }

        items.sort_by_key(|item| item.start_time);
        Ok(items)
    }
}
