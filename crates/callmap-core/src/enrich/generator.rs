//! Text-generation collaborator.
//!
//! [`DocGenerator`] is the seam the orchestrator calls through; the HTTP
//! implementation talks to an Ollama-compatible `/api/chat` endpoint with
//! structured output constrained by the request's response schema.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::enrich::schema::ResponseSchema;
use crate::errors::{CallmapError, CallmapResult};

/// Produces a raw reply body for a prompt, shaped by `schema`.
///
/// Any failure (transport, timeout, bad status, empty body) is returned as
/// an ordinary error and handled by the caller's retry policy.
pub trait DocGenerator: Send + Sync {
    fn generate(&self, prompt: &str, schema: &ResponseSchema) -> CallmapResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: Value,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> CallmapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DocGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str, schema: &ResponseSchema) -> CallmapResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            format: schema.to_json_schema(),
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(&self.endpoint).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CallmapError::Generation(format!(
                "{} returned {status}: {body}",
                self.endpoint
            )));
        }

        let chat: ChatResponse = response.json()?;
        let content = chat.message.content;
        debug!(
            model = %self.model,
            fields = schema.len(),
            bytes = content.len(),
            "generation reply received"
        );
        if content.trim().is_empty() {
            return Err(CallmapError::Generation("empty reply".to_string()));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_config() {
        let config = GeneratorConfig {
            api_base: "http://127.0.0.1:11434/".to_string(),
            ..GeneratorConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        assert_eq!(generator.endpoint(), "http://127.0.0.1:11434/api/chat");
    }

    #[test]
    fn test_chat_request_shape() {
        let schema = ResponseSchema::for_batch("com.a.B", &["com.a.B.foo".to_string()]);
        let request = ChatRequest {
            model: "llama3.2",
            messages: vec![ChatMessage {
                role: "user",
                content: "document this",
            }],
            stream: false,
            format: schema.to_json_schema(),
            options: ChatOptions { temperature: 0.0 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value["format"]["properties"]["com.a.B.foo"].is_object());
    }

    #[test]
    fn test_unreachable_endpoint_is_a_recoverable_error() {
        let config = GeneratorConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..GeneratorConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        let schema = ResponseSchema::for_batch("com.a.B", &[]);
        let err = generator.generate("hello", &schema).unwrap_err();
        assert!(!err.is_fatal());
    }
}
