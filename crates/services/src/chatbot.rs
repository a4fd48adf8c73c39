use knowa_config::AiSettings;
use knowa_db::models::{Event, Faq};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_MANUAL: &str = "BASIC INSTRUCTIONS:\n\
1. REGISTRATION: Click 'Sign Up' on the Login screen.\n\
2. MEMBERSHIP: Status starts as 'Pending'. Pay fees to approve.\n\
3. DONATIONS: Use the blue 'Donate' button.\n\
4. PASSWORD: Use 'Forgot Password' for TAC code.\n";

const SEPARATOR: &str = "---------------------\n";

#[derive(Debug, thiserror::Error)]
pub enum ChatbotError {
    #[error("AI assistant is not configured")]
    NotConfigured,
    #[error("AI request failed: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone)]
pub struct ChatbotService {
    client: Client,
    settings: AiSettings,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Prompt sent to the model: the manual, every FAQ, the next events and the question.
pub fn build_prompt(question: &str, faqs: &[Faq], upcoming: &[Event]) -> String {
    let mut faq_context = String::from("COMMON QUESTIONS & ANSWERS:\n");
    for faq in faqs {
        faq_context.push_str(&format!("Q: {}\nA: {}\n", faq.question, faq.answer));
    }

    let mut events_context = String::from("UPCOMING EVENTS:\n");
    if upcoming.is_empty() {
        events_context.push_str("No upcoming events found.\n");
    }
    for event in upcoming {
        events_context.push_str(&format!(
            "- {} on {} ({})\n",
            event.title,
            event.start_time.to_chrono().format("%b %d, %I:%M %p"),
            event.location
        ));
    }

    format!(
        "You are the friendly AI support for KNOWA app. Answer using the context below.\n\n\
         {APP_MANUAL}\n{SEPARATOR}{faq_context}\n{SEPARATOR}{events_context}\n{SEPARATOR}\
         USER QUESTION: {question}"
    )
}

impl ChatbotService {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn is_available(&self) -> bool {
        self.settings
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub async fn ask(&self, prompt: String) -> Result<String, ChatbotError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatbotError::NotConfigured)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.settings.max_output_tokens,
            },
        };

        let url = format!(
            "{}/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatbotError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "AI endpoint returned an error");
            return Err(ChatbotError::Upstream(format!("{}: {}", status, body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ChatbotError::Upstream(format!("Failed to parse response: {}", e)))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        if reply.trim().is_empty() {
            return Err(ChatbotError::Upstream("Empty reply".to_string()));
        }
        Ok(reply)
    }
}
