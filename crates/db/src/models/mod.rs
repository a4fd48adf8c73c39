pub mod badge;
pub mod chat_room;
pub mod donation;
pub mod event;
pub mod faq;
pub mod feedback;
pub mod interview;
pub mod meeting;
pub mod message;
pub mod notification;
pub mod user;
pub mod user_profile;

pub use badge::*;
pub use chat_room::*;
pub use donation::*;
pub use event::*;
pub use faq::*;
pub use feedback::*;
pub use interview::*;
pub use meeting::*;
pub use message::*;
pub use notification::*;
pub use user::*;
pub use user_profile::*;
