use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AiConfig;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint, used to turn
/// a data sample into a short text summary.
#[derive(Clone)]
pub struct InsightClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl InsightClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Chartarr/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build insight HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Build the analyst prompt from column headers and a row sample.
    #[must_use]
    pub fn build_prompt(headers: &[String], sample_rows: &[Vec<Value>]) -> String {
        format!(
            "You are a data analyst. Analyze the following tabular data with columns: {}.\n\
             Here are some sample rows:\n{}\n\n\
             Provide a brief summary highlighting key trends, anomalies, or insights.",
            headers.join(", "),
            serde_json::to_string(sample_rows).unwrap_or_default(),
        )
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a helpful assistant.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Inference API returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_mentions_columns_and_sample() {
        let headers = vec!["Product".to_string(), "Sales".to_string()];
        let rows = vec![vec![Value::from("Widget"), Value::from(120)]];

        let prompt = InsightClient::build_prompt(&headers, &rows);
        assert!(prompt.contains("Product, Sales"));
        assert!(prompt.contains("Widget"));
    }
}
