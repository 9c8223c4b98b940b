//! Chat-completion client for the hosted model gateway

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{config::AssistantConfig, error::AssistantError};

pub const DEFAULT_TOPIC: &str = "general environmental awareness";
pub const FALLBACK_ANSWER: &str = "I'm unable to provide an answer right now.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Instructions that keep the assistant on cleanliness topics for `city`
pub fn system_prompt(city: &str, topic: Option<&str>) -> String {
    let topic = topic.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOPIC);

    format!(
        "You are an AI assistant for Mission Clean {city} (Swachhata Sewa), a municipal cleanliness and environmental awareness initiative.

Your role is to:
- Provide accurate information about waste management, pollution prevention, and cleanliness
- Give practical tips for citizens of {city}
- Explain environmental issues in simple terms
- Suggest actions citizens can take to improve their environment
- Provide information relevant to Indian context, especially {city} city

Guidelines:
- Keep responses concise (2-3 paragraphs max)
- Use simple language
- Include actionable tips when relevant
- Be encouraging and positive
- If asked about non-environmental topics, politely redirect to your expertise area

Topic context: {topic}"
    )
}

#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl Gateway {
    pub fn new(config: AssistantConfig) -> Self {
        Gateway {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Forward one question and return the model's answer
    pub async fn ask(&self, question: &str, topic: Option<&str>) -> Result<String, AssistantError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AssistantError::MissingApiKey)?;

        let prompt = system_prompt(&self.config.city, topic);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            info!("AI gateway is rate limiting requests");
            return Err(AssistantError::Busy);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("AI gateway returned {}: {}", status, detail);
            return Err(AssistantError::Upstream(status.as_u16()));
        }

        let completion: ChatResponse = response.json().await?;
        let answer = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_city_and_topic() {
        let prompt = system_prompt("Nagpur", Some("composting"));
        assert!(prompt.starts_with("You are an AI assistant for Mission Clean Nagpur"));
        assert!(prompt.contains("especially Nagpur city"));
        assert!(prompt.ends_with("Topic context: composting"));
    }

    #[test]
    fn test_prompt_default_topic() {
        assert!(system_prompt("Pune", None).ends_with(DEFAULT_TOPIC));
        assert!(system_prompt("Pune", Some("  ")).ends_with(DEFAULT_TOPIC));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let gateway = Gateway::new(AssistantConfig {
            api_key: None,
            gateway_url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
            model: "m".to_string(),
            city: "Nagpur".to_string(),
        });

        let err = gateway.ask("How do I compost?", None).await.unwrap_err();
        assert!(matches!(err, AssistantError::MissingApiKey));
    }
}
