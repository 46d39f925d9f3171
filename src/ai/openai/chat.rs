use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, JsonSchema, ResponseFormat};
use crate::ai::ReinterpretService;
use crate::models::{Category, Reinterpretation};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Reinterprets prompts through OpenAI chat completions in strict structured-output mode.
pub struct OpenAiReinterpretClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiReinterpretClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            http: OpenAiHttpClient::new(api_key, timeout),
            model,
        }
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        client: Client,
        timeout: Duration,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, client, timeout),
            model,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

fn reinterpretation_format() -> ResponseFormat {
    let per_language = |item: serde_json::Value| {
        json!({
            "type": "object",
            "properties": { "fr": item, "en": item, "pt": item },
            "required": ["fr", "en", "pt"],
            "additionalProperties": false
        })
    };

    ResponseFormat {
        format_type: "json_schema".to_string(),
        json_schema: JsonSchema {
            name: "asset_metadata".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "category": { "type": "string", "enum": Category::ALL },
                    "theme": { "type": "string" },
                    "labels": per_language(json!({ "type": "string" })),
                    "tags": per_language(json!({
                        "type": "array",
                        "items": { "type": "string" }
                    })),
                    "visual_description": { "type": "string" }
                },
                "required": ["category", "theme", "labels", "tags", "visual_description"],
                "additionalProperties": false
            }),
            strict: true,
        },
    }
}

#[async_trait]
impl ReinterpretService for OpenAiReinterpretClient {
    async fn classify_and_rewrite(
        &self,
        prompt: &str,
        allowed_themes: &[String],
    ) -> Result<Reinterpretation> {
        let instruction = prompts::reinterpret_instruction(prompt, allowed_themes);
        debug!("Reinterpretation instruction: {}", instruction);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(instruction),
            }],
            max_completion_tokens: None,
            response_format: Some(reinterpretation_format()),
        };

        let response = self.http.chat_completion(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::AiProvider("No response from OpenAI chat API".to_string()))?;

        let reinterpretation: Reinterpretation = serde_json::from_str(&content)?;
        info!(
            "Prompt reinterpreted as {:?} in theme '{}': {}",
            reinterpretation.category,
            reinterpretation.theme,
            reinterpretation.visual_description
        );

        Ok(reinterpretation)
    }
}
