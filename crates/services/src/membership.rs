//! Membership lifecycle: application, interview, approval and payment.
//!
//! Every admin transition is a single conditional update on the user's
//! `member_status`; a status outside the allowed set surfaces as
//! `DaoError::InvalidTransition` while a missing user stays `NotFound`.

use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use knowa_db::models::{
    ChatRoom, Interview, InterviewStatus, MemberStatus, NotificationType, User, UserProfile,
};
use tracing::info;

use crate::dao::base::{DaoError, DaoResult};
use crate::dao::chat::ChatDao;
use crate::dao::interview::InterviewDao;
use crate::dao::user::{ProfileUpdate, UserDao};
use crate::notifier::Notifier;

pub const DEFAULT_REJECTION_REASON: &str = "Application rejected by Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    SubmitApplication,
    ScheduleInterview,
    ApproveMember,
    ApproveVolunteer,
    RejectApplication,
    ConfirmPayment,
    RejectPayment,
}

const UNDER_REVIEW: &[MemberStatus] = &[MemberStatus::Pending, MemberStatus::Interview];

impl MembershipAction {
    pub const ALL: [MembershipAction; 7] = [
        MembershipAction::SubmitApplication,
        MembershipAction::ScheduleInterview,
        MembershipAction::ApproveMember,
        MembershipAction::ApproveVolunteer,
        MembershipAction::RejectApplication,
        MembershipAction::ConfirmPayment,
        MembershipAction::RejectPayment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::SubmitApplication => "submit_application",
            MembershipAction::ScheduleInterview => "schedule_interview",
            MembershipAction::ApproveMember => "approve_member",
            MembershipAction::ApproveVolunteer => "approve_volunteer",
            MembershipAction::RejectApplication => "reject_application",
            MembershipAction::ConfirmPayment => "confirm_payment",
            MembershipAction::RejectPayment => "reject_payment",
        }
    }

    /// Statuses the action may start from. `None` means any status.
    pub fn allowed_from(&self) -> Option<&'static [MemberStatus]> {
        match self {
            MembershipAction::SubmitApplication => Some(&[MemberStatus::Public]),
            MembershipAction::ScheduleInterview => None,
            MembershipAction::ApproveMember
            | MembershipAction::ApproveVolunteer
            | MembershipAction::RejectApplication => Some(UNDER_REVIEW),
            MembershipAction::ConfirmPayment | MembershipAction::RejectPayment => {
                Some(&[MemberStatus::ApprovedUnpaid])
            }
        }
    }

    pub fn target(&self) -> MemberStatus {
        match self {
            MembershipAction::SubmitApplication => MemberStatus::Pending,
            MembershipAction::ScheduleInterview => MemberStatus::Interview,
            MembershipAction::ApproveMember => MemberStatus::ApprovedUnpaid,
            MembershipAction::ApproveVolunteer => MemberStatus::Volunteer,
            MembershipAction::RejectApplication => MemberStatus::Rejected,
            MembershipAction::ConfirmPayment => MemberStatus::Member,
            MembershipAction::RejectPayment => MemberStatus::Rejected,
        }
    }

    pub fn permits(&self, current: MemberStatus) -> bool {
        self.allowed_from()
            .is_none_or(|allowed| allowed.contains(&current))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewOutcome {
    Pass,
    Fail,
}

impl std::str::FromStr for InterviewOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(InterviewOutcome::Pass),
            "fail" => Ok(InterviewOutcome::Fail),
            other => Err(format!("unknown interview outcome '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationResult {
    pub user: User,
    pub profile: UserProfile,
    pub transitioned: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduledInterview {
    pub applicant: User,
    pub interview: Interview,
    pub room: ChatRoom,
}

#[derive(Clone)]
pub struct MembershipService {
    users: Arc<UserDao>,
    interviews: Arc<InterviewDao>,
    chat: Arc<ChatDao>,
    notifier: Notifier,
}

impl MembershipService {
    pub fn new(
        users: Arc<UserDao>,
        interviews: Arc<InterviewDao>,
        chat: Arc<ChatDao>,
        notifier: Notifier,
    ) -> Self {
        Self {
            users,
            interviews,
            chat,
            notifier,
        }
    }

    async fn apply(&self, action: MembershipAction, user_id: ObjectId) -> DaoResult<User> {
        self.users
            .transition(user_id, action.allowed_from(), action.target(), action.as_str())
            .await
    }

    /// Saves the form. The PUBLIC -> PENDING step only happens once; later
    /// submissions update the profile and leave the status alone.
    pub async fn submit_application(
        &self,
        user_id: ObjectId,
        form: &ProfileUpdate,
    ) -> DaoResult<ApplicationResult> {
        let mut profile = self.users.update_profile(user_id, form).await?;

        let (user, transitioned) = match self
            .apply(MembershipAction::SubmitApplication, user_id)
            .await
        {
            Ok(user) => (user, true),
            Err(DaoError::InvalidTransition { .. }) => {
                (self.users.base.find_by_id(user_id).await?, false)
            }
            Err(e) => return Err(e),
        };

        if transitioned {
            self.users
                .set_profile_field(user_id, "application_date", DateTime::now())
                .await?;
            profile = self.users.profile(user_id).await?;

            let name = profile
                .full_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| user.full_name());
            self.notifier
                .notify_all_admins(
                    "New Membership Application",
                    &format!("{} has submitted a membership application.", name),
                    NotificationType::Warning,
                )
                .await?;
        }

        Ok(ApplicationResult {
            user,
            profile,
            transitioned,
        })
    }

    /// Moves the applicant to INTERVIEW from any status, records the
    /// interview and makes sure its chat room exists with applicant,
    /// scheduler and interviewer in it.
    pub async fn schedule_interview(
        &self,
        scheduler: &User,
        applicant_id: ObjectId,
        date_time: DateTime,
        interviewer_id: Option<ObjectId>,
        meeting_link: Option<String>,
    ) -> DaoResult<ScheduledInterview> {
        let scheduler_id = scheduler.id.ok_or(DaoError::NotFound)?;
        if let Some(interviewer_id) = interviewer_id {
            if !self.users.base.exists(bson::doc! { "_id": interviewer_id }).await? {
                return Err(DaoError::Validation("Interviewer not found".to_string()));
            }
        }

        let applicant = self
            .apply(MembershipAction::ScheduleInterview, applicant_id)
            .await?;

        let interview = self
            .interviews
            .upsert_for_applicant(
                applicant_id,
                scheduler_id,
                interviewer_id,
                date_time,
                meeting_link.unwrap_or_default(),
            )
            .await?;
        let interview_id = interview.id.ok_or(DaoError::NotFound)?;

        let mut participants = vec![applicant_id, scheduler_id];
        if let Some(interviewer_id) = interviewer_id {
            if !participants.contains(&interviewer_id) {
                participants.push(interviewer_id);
            }
        }
        let room_name = format!("Interview: {} - SCHEDULED", applicant.display_name());
        let room = self
            .chat
            .get_or_create_interview_room(interview_id, &room_name, &participants)
            .await?;

        info!(%applicant_id, %interview_id, room_id = ?room.id, "Interview scheduled");
        Ok(ScheduledInterview {
            applicant,
            interview,
            room,
        })
    }

    /// Records the interview result. Allowed for superusers, staff and the
    /// interview's scheduler or interviewer. A non-empty report is always kept.
    pub async fn grade_interview(
        &self,
        grader: &User,
        applicant_id: ObjectId,
        outcome: InterviewOutcome,
        report: Option<&str>,
    ) -> DaoResult<Interview> {
        let applicant = self.users.base.find_by_id(applicant_id).await?;
        let interview = self.interviews.find_by_applicant(applicant_id).await?;
        let interview_id = interview.id.ok_or(DaoError::NotFound)?;

        let authorized = grader.is_superuser
            || grader.is_staff
            || (grader.id.is_some()
                && (interview.scheduler_id == grader.id || interview.interviewer_id == grader.id));
        if !authorized {
            return Err(DaoError::Forbidden(
                "You are not authorized to grade this interview".to_string(),
            ));
        }

        let report = report.map(str::trim).filter(|r| !r.is_empty());
        let (member_status, interview_status, title, message, kind) = match outcome {
            InterviewOutcome::Pass => (
                MemberStatus::ApprovedUnpaid,
                InterviewStatus::Completed,
                "Interview Passed!",
                "Congratulations! You passed the interview. Please proceed to the dashboard to pay your membership fee.",
                NotificationType::Success,
            ),
            InterviewOutcome::Fail => (
                MemberStatus::Rejected,
                InterviewStatus::Rejected,
                "Application Update",
                "Thank you for your interest. Unfortunately, your application was not successful at this time.",
                NotificationType::Error,
            ),
        };

        let attempted = match outcome {
            InterviewOutcome::Pass => "grade_interview:pass",
            InterviewOutcome::Fail => "grade_interview:fail",
        };
        self.users
            .transition(applicant_id, None, member_status, attempted)
            .await?;
        let interview = self
            .interviews
            .record_outcome(interview_id, interview_status, report)
            .await?;

        info!(
            %applicant_id,
            from = %applicant.member_status,
            to = %member_status,
            "Interview graded"
        );
        self.notifier.send(applicant_id, title, message, kind).await?;
        Ok(interview)
    }

    pub async fn approve_member(&self, applicant_id: ObjectId) -> DaoResult<User> {
        let user = self.apply(MembershipAction::ApproveMember, applicant_id).await?;
        self.notifier
            .send(
                applicant_id,
                "Membership Application Approved",
                "Congratulations! Your application has been approved. Please proceed to pay your membership fee.",
                NotificationType::Success,
            )
            .await?;
        Ok(user)
    }

    pub async fn approve_volunteer(&self, applicant_id: ObjectId) -> DaoResult<User> {
        self.apply(MembershipAction::ApproveVolunteer, applicant_id).await
    }

    /// Rejects the application and stores the reason on the profile.
    pub async fn reject_application(
        &self,
        applicant_id: ObjectId,
        reason: Option<&str>,
    ) -> DaoResult<(User, String)> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON)
            .to_string();

        let user = self
            .apply(MembershipAction::RejectApplication, applicant_id)
            .await?;
        self.users
            .set_profile_field(applicant_id, "rejection_reason", reason.as_str())
            .await?;
        self.notifier
            .send(
                applicant_id,
                "Application Update",
                &format!("Your membership application was not approved. Reason: {}", reason),
                NotificationType::Error,
            )
            .await?;
        Ok((user, reason))
    }

    pub async fn confirm_payment(&self, applicant_id: ObjectId) -> DaoResult<User> {
        self.apply(MembershipAction::ConfirmPayment, applicant_id).await
    }

    pub async fn reject_payment(&self, applicant_id: ObjectId) -> DaoResult<User> {
        self.apply(MembershipAction::RejectPayment, applicant_id).await
    }
}
