use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    /// Comma separated, e.g. "Education,Arts".
    #[serde(default)]
    pub interests: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub member_status: MemberStatus,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    pub tac_code: Option<String>,
    pub tac_expires_at: Option<DateTime>,
    pub last_login_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[default]
    Public,
    Pending,
    Interview,
    ApprovedUnpaid,
    Volunteer,
    Member,
    Rejected,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 7] = [
        MemberStatus::Public,
        MemberStatus::Pending,
        MemberStatus::Interview,
        MemberStatus::ApprovedUnpaid,
        MemberStatus::Volunteer,
        MemberStatus::Member,
        MemberStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Public => "PUBLIC",
            MemberStatus::Pending => "PENDING",
            MemberStatus::Interview => "INTERVIEW",
            MemberStatus::ApprovedUnpaid => "APPROVED_UNPAID",
            MemberStatus::Volunteer => "VOLUNTEER",
            MemberStatus::Member => "MEMBER",
            MemberStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse role used for event registration and FAQ targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTier {
    Public,
    Member,
    Staff,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn tier(&self) -> RoleTier {
        if self.is_admin() {
            RoleTier::Staff
        } else if matches!(
            self.member_status,
            MemberStatus::Member | MemberStatus::Volunteer
        ) {
            RoleTier::Member
        } else {
            RoleTier::Public
        }
    }

    /// First name when set, otherwise the local part of the username.
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        if !first.is_empty() {
            return first.to_string();
        }
        self.username
            .split('@')
            .next()
            .unwrap_or(&self.username)
            .to_string()
    }

    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

fn bool_true() -> bool {
    true
}
