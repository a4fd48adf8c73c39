pub mod accounts;
pub mod auth;
pub mod chat;
pub mod chatbot;
pub mod dao;
pub mod events;
pub mod mail;
pub mod membership;
pub mod notifier;
pub mod reminders;

pub use accounts::AccountService;
pub use auth::AuthService;
pub use chat::ChatService;
pub use chatbot::ChatbotService;
pub use dao::*;
pub use events::EventService;
pub use mail::MailService;
pub use membership::MembershipService;
pub use notifier::Notifier;
pub use reminders::ReminderService;
