pub mod auth;
pub mod badge;
pub mod chat;
pub mod chatbot;
pub mod donation;
pub mod event;
pub mod files;
pub mod notification;
pub mod user;
