use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::external::error::ExternalError;

/// Language-model synthesis contract: turn a prompt plus retrieved
/// context into raw model output. Whether the output honors the active
/// question's response-format contract is the caller's problem.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str, context: &[String]) -> Result<String>;

    /// Identifier recorded in every answer's bookkeeping.
    fn model_id(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub host: String,
    pub port: u16,
    pub temperature: f32,
}

impl LLMConfig {
    /// Get the full URL for the Ollama service
    pub fn get_url(&self) -> Result<String> {
        let url = if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        };

        Url::parse(&url).map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;

        Ok(url)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            // Compliance answers should be deterministic.
            temperature: 0.0,
        }
    }
}

/// Ollama chat-API synthesizer. The request carries a JSON format
/// constraint matching the answer contract, which pushes most models
/// into emitting parseable output.
pub struct OllamaSynthesizer {
    endpoint: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl OllamaSynthesizer {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let endpoint = config.get_url()?;
        Ok(Self {
            endpoint,
            model: config.model,
            temperature: config.temperature,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl Synthesizer for OllamaSynthesizer {
    async fn synthesize(&self, prompt: &str, context: &[String]) -> Result<String> {
        let user_msg = if context.is_empty() {
            prompt.to_string()
        } else {
            format!(
                "{prompt}\n\nContext sections from the paper:\n{}",
                context.join("\n---\n")
            )
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&serde_json::json!({
                "model": &self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You answer compliance questions about an academic paper \
                                    using only the provided context sections. Respond with a \
                                    single JSON object and nothing else."
                    },
                    {
                        "role": "user",
                        "content": user_msg
                    }
                ],
                "stream": false,
                "options": { "temperature": self.temperature },
                "format": {
                    "type": "object",
                    "required": ["answer", "section name", "justification"],
                    "properties": {
                        "answer": { "type": "string" },
                        "section name": { "type": "string" },
                        "justification": { "type": "string" }
                    }
                }
            }))
            .send()
            .await
            .map_err(|e| ExternalError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(ExternalError::OllamaError(error_text)));
        }

        #[derive(Debug, Deserialize)]
        struct ChatMessage {
            content: String,
        }

        #[derive(Debug, Deserialize)]
        struct ChatResponse {
            message: ChatMessage,
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExternalError::OllamaError(e.to_string()))?;
        Ok(chat.message.content)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
