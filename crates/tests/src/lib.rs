pub mod fixtures;

#[cfg(test)]
mod membership_tests;
#[cfg(test)]
mod chat_tests;
#[cfg(test)]
mod event_tests;
#[cfg(test)]
mod chatbot_tests;
