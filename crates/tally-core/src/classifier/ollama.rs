//! Ollama classifier
//!
//! Sends the raw message to `/api/generate` and expects a JSON object such as
//! `{"category": "food"}` somewhere in the model's answer.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

use super::CategoryClassifier;

#[derive(Clone)]
pub struct OllamaClassifier {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn build_prompt(text: &str) -> String {
    let categories = Category::all()
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You categorize bank and UPI notification messages.\n\
         Allowed categories: {}.\n\
         Reply with JSON only, for example {{\"category\": \"food\"}}.\n\
         Message: {}\n",
        categories, text
    )
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct CategoryAnswer {
    category: String,
}

/// Pull the category out of a model answer that may wrap JSON in prose
pub fn parse_category_response(response: &str) -> Result<Category> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::Classifier(format!(
                "No JSON found in classifier response | Raw: {}",
                truncate(response)
            )))
        }
    };

    let answer: CategoryAnswer = serde_json::from_str(json_str).map_err(|e| {
        Error::Classifier(format!(
            "Invalid JSON from classifier: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    Category::from_label(&answer.category)
        .ok_or_else(|| Error::Classifier(format!("Unknown category label: {}", answer.category)))
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

#[async_trait]
impl CategoryClassifier for OllamaClassifier {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn classify(&self, text: &str) -> Result<Category> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: build_prompt(text),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama classifier response: {}", ollama_response.response);

        parse_category_response(&ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockOllamaServer;

    #[test]
    fn test_parse_category_response() {
        assert_eq!(
            parse_category_response(r#"{"category": "food"}"#).unwrap(),
            Category::Food
        );
        assert_eq!(
            parse_category_response("Sure! Here you go: {\"category\": \"Transport\"} Hope it helps")
                .unwrap(),
            Category::Travel
        );
        assert!(parse_category_response("food").is_err());
        assert!(parse_category_response(r#"{"category": "astrology"}"#).is_err());
        assert!(parse_category_response(r#"{"label": "food"}"#).is_err());
    }

    #[test]
    fn test_prompt_lists_categories() {
        let prompt = build_prompt("Rs 10 paid");
        assert!(prompt.contains("entertainment"));
        assert!(prompt.contains("Message: Rs 10 paid"));
    }

    #[tokio::test]
    async fn test_classify_against_mock_server() {
        let server = MockOllamaServer::start().await;
        let classifier = OllamaClassifier::new(&server.url(), "llama3.2");

        let category = classifier
            .classify("Rs 450 paid for cinema tickets")
            .await
            .unwrap();
        assert_eq!(category, Category::Entertainment);
    }

    #[tokio::test]
    async fn test_classify_unreachable_host() {
        let classifier = OllamaClassifier::new("http://127.0.0.1:9", "llama3.2");
        assert!(classifier.classify("anything").await.is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let classifier = OllamaClassifier::new("http://localhost:11434/", "m");
        assert_eq!(classifier.base_url(), "http://localhost:11434");
        assert_eq!(classifier.model(), "m");
    }
}
