pub mod badge;
pub mod base;
pub mod chat;
pub mod donation;
pub mod event;
pub mod faq;
pub mod feedback;
pub mod interview;
pub mod notification;
pub mod user;

pub use base::BaseDao;
