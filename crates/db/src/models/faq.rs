use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub target_role: FaqAudience,
    #[serde(default)]
    pub order: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FaqAudience {
    #[default]
    All,
    Organizer,
    Crew,
    Participant,
}

impl FaqAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaqAudience::All => "all",
            FaqAudience::Organizer => "organizer",
            FaqAudience::Crew => "crew",
            FaqAudience::Participant => "participant",
        }
    }

    /// Audiences visible to a reader. Guests read like regular users.
    pub fn visible_to(is_staff: bool) -> [FaqAudience; 2] {
        if is_staff {
            [FaqAudience::All, FaqAudience::Organizer]
        } else {
            [FaqAudience::All, FaqAudience::Participant]
        }
    }
}

impl Faq {
    pub const COLLECTION: &'static str = "faqs";
}
